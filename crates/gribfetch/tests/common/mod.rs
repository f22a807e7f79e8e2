#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use gribfetch::{GateConfig, HttpClient, PartialFetcher, RateGate, Response, Retriever, TimeUnit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const URL: &str = "https://data.example/gfs.20230101/00/atmos/gfs.t00z.pgrb2.0p25.f000";

pub const INDEX: &str = "\
1:0:d=2023010100:TMP:2 m above ground:anl:
2:500:d=2023010100:UGRD:10 m above ground:anl:
3:1000:d=2023010100:end:surface:anl:
";

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gribfetch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// 1500 bytes whose values identify their record.
pub fn payload() -> Vec<u8> {
    (0..1500u32).map(|i| (i / 500) as u8 * 10 + (i % 7) as u8).collect()
}

pub fn index_url() -> String {
    format!("{URL}.idx")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub range: Option<String>,
}

#[derive(Debug)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

#[derive(Default)]
struct Inner {
    files: Mutex<HashMap<String, Vec<u8>>>,
    unreachable: Mutex<HashSet<String>>,
    requests: Mutex<Vec<Request>>,
}

/// In-memory server. Multi-span range requests are answered with the spans
/// concatenated, without multipart framing.
#[derive(Clone, Default)]
pub struct MockClient {
    inner: Arc<Inner>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the standard index and payload at [`URL`].
    pub fn with_grib() -> Self {
        let client = Self::new();
        client.serve(&index_url(), INDEX.as_bytes().to_vec());
        client.serve(URL, payload());
        client
    }

    pub fn serve(&self, url: &str, data: Vec<u8>) {
        self.inner.files.lock().unwrap().insert(url.to_string(), data);
    }

    pub fn make_unreachable(&self, url: &str) {
        self.inner.unreachable.lock().unwrap().insert(url.to_string());
    }

    pub fn clear_unreachable(&self, url: &str) {
        self.inner.unreachable.lock().unwrap().remove(url);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, url: &str) -> Vec<Request> {
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }
}

fn slice(data: &[u8], header: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for span in header.trim_start_matches("bytes=").split(',') {
        let (start, end) = span.split_once('-').unwrap();
        let start = start.parse::<usize>().unwrap().min(data.len());
        let end = if end.is_empty() {
            data.len()
        } else {
            (end.parse::<usize>().unwrap() + 1).min(data.len())
        };
        out.extend_from_slice(&data[start..end.max(start)]);
    }
    out
}

fn response(status: u16, body: Vec<u8>) -> Response<MockError> {
    let chunks: Vec<Result<Bytes, MockError>> = body
        .chunks(64)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    Response {
        status,
        body: Box::pin(futures_util::stream::iter(chunks)),
    }
}

impl HttpClient for MockClient {
    type Error = MockError;

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Response<Self::Error>, Self::Error> {
        let range = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("range"))
            .map(|(_, value)| value.clone());
        self.inner.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            range: range.clone(),
        });

        if self.inner.unreachable.lock().unwrap().contains(url) {
            return Err(MockError(format!("connection refused: {url}")));
        }

        let data = self.inner.files.lock().unwrap().get(url).cloned();
        Ok(match (data, range) {
            (None, _) => response(404, Vec::new()),
            (Some(data), None) => response(200, data),
            (Some(data), Some(header)) => response(206, slice(&data, &header)),
        })
    }
}

pub fn gate_config(dir: &Path) -> GateConfig {
    GateConfig::default()
        .pings(1000)
        .unit(TimeUnit::Seconds)
        .state_path(dir.join("pacing.lock"))
        .lock_timeout(Duration::from_millis(200))
        .poll_interval(Duration::from_millis(5))
}

pub fn retriever(client: MockClient, dir: &Path) -> Retriever<MockClient> {
    let gate = RateGate::new(&gate_config(dir)).unwrap();
    Retriever::new(PartialFetcher::new(client, gate))
}
