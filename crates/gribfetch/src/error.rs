//! Error types for gribfetch.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Network stage a remote failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Index,
    Payload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Index => write!(f, "index"),
            Stage::Payload => write!(f, "payload"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("timed out after {waited:?} waiting for pacing lock '{path}'")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("pacing state '{path}' unusable: {source}")]
    Pacing {
        path: PathBuf,
        source: gribfetch_fs::Error,
    },

    #[error("{stage} unavailable at {url}: {reason}")]
    RemoteUnavailable {
        url: String,
        stage: Stage,
        reason: String,
    },

    #[error("no index records match {patterns:?}")]
    NoMatchingRecords { patterns: Vec<String> },

    #[error("malformed index line {line}: '{text}'")]
    MalformedIndex { line: usize, text: String },

    #[error("transfer failed for {url}: {reason}")]
    TransferFailed { url: String, reason: String },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error(transparent)]
    Fs(#[from] gribfetch_fs::Error),
}

impl Error {
    /// True for failures of the pacing gate itself rather than the gated work.
    pub fn is_gate_failure(&self) -> bool {
        matches!(self, Error::LockTimeout { .. } | Error::Pacing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
