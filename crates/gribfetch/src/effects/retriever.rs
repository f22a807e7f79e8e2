use std::fmt;

use tracing::{error, info, warn};

use crate::core::resolve;
use crate::data::{Config, RangeSet, RetrievalTarget, RetrieveOptions};
use crate::effects::fetcher::PartialFetcher;
use crate::effects::gate::RateGate;
use crate::effects::http::HttpClient;
use crate::error::{Error, Result};

/// Terminal state of one retrieval.
///
/// `START → (AlreadyPresent | fetch index) → resolve → fetch payload → Done`,
/// or one of the failure states along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalState {
    /// Output already on disk and clobber not set; nothing fetched.
    AlreadyPresent,
    Done,
    IndexUnavailable,
    NoMatch,
    TransferFailed,
    /// The pacing gate timed out or its state file was unusable.
    GateFailed,
}

impl fmt::Display for RetrievalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalState::AlreadyPresent => write!(f, "already present"),
            RetrievalState::Done => write!(f, "done"),
            RetrievalState::IndexUnavailable => write!(f, "index unavailable"),
            RetrievalState::NoMatch => write!(f, "no match"),
            RetrievalState::TransferFailed => write!(f, "transfer failed"),
            RetrievalState::GateFailed => write!(f, "gate failed"),
        }
    }
}

/// Structured result for one target.
#[derive(Debug)]
pub struct Outcome {
    pub state: RetrievalState,
    /// Whether the output file is on disk after the run, fresh or not.
    pub exists: bool,
    /// Patterns that matched no index record.
    pub missing: Vec<String>,
    pub error: Option<Error>,
}

impl Outcome {
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, RetrievalState::AlreadyPresent | RetrievalState::Done)
    }
}

/// Drives a [`RetrievalTarget`] from cache check through payload transfer.
pub struct Retriever<C: HttpClient> {
    fetcher: PartialFetcher<C>,
}

impl<C: HttpClient> Retriever<C> {
    pub fn new(fetcher: PartialFetcher<C>) -> Self {
        Self { fetcher }
    }

    pub fn with_client(client: C, config: &Config) -> Result<Self> {
        let gate = RateGate::new(&config.gate)?;
        Ok(Self::new(PartialFetcher::new(client, gate)))
    }

    pub fn fetcher(&self) -> &PartialFetcher<C> {
        &self.fetcher
    }

    /// Retrieve one target. Never fails as a whole; inspect the [`Outcome`].
    pub async fn retrieve(&self, target: &RetrievalTarget, options: &RetrieveOptions) -> Outcome {
        if !target.clobber && target.output.is_file() {
            info!(url = %target.url, path = %target.output.display(), "file already exists");
            return Outcome {
                state: RetrievalState::AlreadyPresent,
                exists: true,
                missing: Vec::new(),
                error: None,
            };
        }

        info!(url = %target.url, "attempting retrieval");
        let (state, missing, error) = self.run(target, options).await;

        Outcome {
            state,
            exists: target.output.is_file(),
            missing,
            error,
        }
    }

    /// Retrieve targets one after another, continuing past failures.
    pub async fn retrieve_all(
        &self,
        targets: &[RetrievalTarget],
        options: &RetrieveOptions,
    ) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            outcomes.push(self.retrieve(target, options).await);
        }
        outcomes
    }

    async fn run(
        &self,
        target: &RetrievalTarget,
        options: &RetrieveOptions,
    ) -> (RetrievalState, Vec<String>, Option<Error>) {
        let mut missing = Vec::new();

        let ranges = if target.patterns.is_empty() {
            RangeSet::whole()
        } else {
            let index_url = target.index_url();
            let cache = target.index_cache_path(options.keep_index);
            let index = match self
                .fetcher
                .fetch_index(&index_url, cache.as_deref(), target.clobber)
                .await
            {
                Ok(index) => index,
                Err(e) => {
                    error!(url = %index_url, stage = "index", error = %e, "index not retrieved");
                    let state = if e.is_gate_failure() {
                        RetrievalState::GateFailed
                    } else {
                        RetrievalState::IndexUnavailable
                    };
                    return (state, missing, Some(e));
                }
            };

            match resolve(&index, &target.patterns) {
                Ok(resolution) => {
                    missing = resolution.missing;
                    resolution.ranges
                }
                Err(e) => {
                    error!(url = %index_url, stage = "resolve", error = %e, "no records to fetch");
                    return (RetrievalState::NoMatch, missing, Some(e));
                }
            }
        };

        match self
            .fetcher
            .transfer(&target.url, &ranges, &target.output)
            .await
        {
            Ok(_) => {
                if let Some(callback) = &options.on_complete {
                    callback(&target.output);
                }
                (RetrievalState::Done, missing, None)
            }
            Err(e) => {
                let state = if e.is_gate_failure() {
                    error!(url = %target.url, stage = "payload", error = %e, "payload not retrieved");
                    RetrievalState::GateFailed
                } else {
                    warn!(url = %target.url, stage = "payload", error = %e, "error while downloading");
                    RetrievalState::TransferFailed
                };
                (state, missing, Some(e))
            }
        }
    }
}

#[cfg(feature = "reqwest")]
impl Retriever<crate::effects::http::ReqwestClient> {
    /// Production retriever built entirely from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = crate::effects::http::ReqwestClient::new(&config.http)?;
        Self::with_client(client, config)
    }
}
