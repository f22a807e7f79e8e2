use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::pattern::MatchSpec;

/// Invoked with the output path after a successful payload transfer.
pub type CompletionCallback = Arc<dyn Fn(&Path) + Send + Sync>;

/// One remote file and the records wanted from it.
#[derive(Debug, Clone)]
pub struct RetrievalTarget {
    /// Remote payload URL; the index lives at `{url}.idx`.
    pub url: String,
    pub output: PathBuf,
    /// Where to cache the index document, if anywhere.
    pub index_path: Option<PathBuf>,
    pub patterns: MatchSpec,
    /// Re-download even when local copies exist.
    pub clobber: bool,
}

impl RetrievalTarget {
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>, patterns: MatchSpec) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            index_path: None,
            patterns,
            clobber: false,
        }
    }

    #[must_use]
    pub fn clobber(mut self, clobber: bool) -> Self {
        self.clobber = clobber;
        self
    }

    #[must_use]
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn index_url(&self) -> String {
        format!("{}.idx", self.url)
    }

    /// Index cache location: the explicit path, else `<output dir>/<remote
    /// name>.idx` when `keep_index` is set.
    pub fn index_cache_path(&self, keep_index: bool) -> Option<PathBuf> {
        if let Some(path) = &self.index_path {
            return Some(path.clone());
        }
        if !keep_index {
            return None;
        }

        let remote_name = self
            .url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.output
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "download".to_string());

        let dir = self.output.parent().unwrap_or_else(|| Path::new(""));
        Some(dir.join(format!("{remote_name}.idx")))
    }
}

/// Per-call retrieval behaviour.
#[derive(Clone)]
pub struct RetrieveOptions {
    /// Cache the index next to the output when the target names no index path.
    ///
    /// Default: true
    pub keep_index: bool,
    pub on_complete: Option<CompletionCallback>,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            keep_index: true,
            on_complete: None,
        }
    }
}

impl fmt::Debug for RetrieveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieveOptions")
            .field("keep_index", &self.keep_index)
            .field("on_complete", &self.on_complete.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl RetrieveOptions {
    #[must_use]
    pub fn keep_index(mut self, keep_index: bool) -> Self {
        self.keep_index = keep_index;
        self
    }

    #[must_use]
    pub fn on_complete(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }
}
