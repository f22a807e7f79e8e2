use std::path::Path;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use gribfetch_fs::Options;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::data::RangeSet;
use crate::effects::gate::RateGate;
use crate::effects::http::HttpClient;
use crate::error::{Error, Result, Stage};

/// Two-stage network access: whole index documents and ranged payloads.
///
/// Every request passes through the [`RateGate`] first.
pub struct PartialFetcher<C: HttpClient> {
    client: C,
    gate: RateGate,
}

impl<C: HttpClient> PartialFetcher<C> {
    pub fn new(client: C, gate: RateGate) -> Self {
        Self { client, gate }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    /// Fetch an index document, preferring a non-empty local cache.
    ///
    /// With `cache` set and `clobber` false, an existing non-empty cache file
    /// is returned without touching the network or the gate. Otherwise the
    /// document is downloaded and, when `cache` is set, written there before
    /// returning.
    pub async fn fetch_index(&self, url: &str, cache: Option<&Path>, clobber: bool) -> Result<Bytes> {
        if let Some(path) = cache {
            if !clobber && is_nonempty_file(path) {
                info!(path = %path.display(), "local index exists, reading it; set clobber to refetch");
                return Ok(Bytes::from(gribfetch_fs::atomic_read(path)?));
            }
        }

        debug!(url, "fetching index");
        let data = self.gate.gate(|| self.download(url)).await??;

        if let Some(path) = cache {
            info!(path = %path.display(), "writing index to local file");
            gribfetch_fs::atomic_write(path, &data, Options::new().create_parents(true))?;
        }

        Ok(data)
    }

    /// Fetch `ranges` of `url` into `output` with a single request.
    ///
    /// An empty range set downloads the whole file. The body is staged next to
    /// `output` and renamed over it only once the transfer completes.
    ///
    /// Returns `Ok(false)` when the server or connection fails; `Err` is
    /// reserved for gate failures and local filesystem errors.
    pub async fn fetch_ranged(&self, url: &str, ranges: &RangeSet, output: &Path) -> Result<bool> {
        match self.transfer(url, ranges, output).await {
            Ok(_) => Ok(true),
            Err(Error::TransferFailed { reason, .. }) => {
                warn!(url, %reason, "transfer failed");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`fetch_ranged`](Self::fetch_ranged), but a remote failure comes
    /// back as [`Error::TransferFailed`] carrying the cause.
    pub(crate) async fn transfer(&self, url: &str, ranges: &RangeSet, output: &Path) -> Result<u64> {
        gribfetch_fs::ensure_parent(output)?;

        let headers: Vec<(String, String)> = ranges
            .header()
            .map(|value| vec![("Range".to_string(), value)])
            .unwrap_or_default();
        debug!(url, ranges = %ranges, "fetching payload");

        let staged = gribfetch_fs::staging_path(output);
        let result = self.gate.gate(|| self.stream_to(url, &headers, &staged)).await?;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&staged).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&staged, output).await {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(gribfetch_fs::Error::write(output, e).into());
        }
        info!(url, path = %output.display(), bytes, "payload written");
        Ok(bytes)
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        let unavailable = |reason: String| Error::RemoteUnavailable {
            url: url.to_string(),
            stage: Stage::Index,
            reason,
        };

        let response = self
            .client
            .get(url, &[])
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if !response.is_success() {
            return Err(unavailable(format!("HTTP {}", response.status)));
        }

        let mut body = response.body;
        let mut data = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| unavailable(e.to_string()))?;
            data.extend_from_slice(&chunk);
        }
        Ok(data.freeze())
    }

    async fn stream_to(&self, url: &str, headers: &[(String, String)], staged: &Path) -> Result<u64> {
        let failed = |reason: String| Error::TransferFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url, headers)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.is_success() {
            return Err(failed(format!("HTTP {}", response.status)));
        }

        let mut file = tokio::fs::File::create(staged)
            .await
            .map_err(|e| gribfetch_fs::Error::write(staged, e))?;

        let mut body = response.body;
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| failed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| gribfetch_fs::Error::write(staged, e))?;
            written += chunk.len() as u64;
        }

        file.sync_all()
            .await
            .map_err(|e| gribfetch_fs::Error::write(staged, e))?;

        Ok(written)
    }
}

fn is_nonempty_file(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}
