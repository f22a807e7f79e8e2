use std::path::{Path, PathBuf};

use gribfetch_fs::Options;
use tracing::{debug, info};

use crate::core::{Resolution, resolve};
use crate::data::MatchSpec;
use crate::error::Result;

/// Trim a local payload down to the records matching `patterns`.
///
/// The index is read from `index`, or `<payload>.idx` when `None`. The
/// resolved ranges are concatenated in order and atomically written over
/// the payload; ranges running past the end of the file are clamped. On any
/// error the payload is left untouched.
pub fn subset_file(
    payload: &Path,
    index: Option<&Path>,
    patterns: &MatchSpec,
    remove_index: bool,
) -> Result<Resolution> {
    let index_path = index.map(Path::to_path_buf).unwrap_or_else(|| sibling_index(payload));

    let document = gribfetch_fs::atomic_read(&index_path)?;
    let resolution = resolve(&document, patterns)?;

    let data = gribfetch_fs::atomic_read(payload)?;
    let size = data.len() as u64;
    let mut subset = Vec::new();
    for range in &resolution.ranges {
        subset.extend_from_slice(&data[range.window(size)]);
    }
    debug!(from = size, to = subset.len(), "subsetting payload");

    gribfetch_fs::atomic_write(payload, &subset, Options::new())?;
    info!(path = %payload.display(), ranges = %resolution.ranges, "payload subset");

    if remove_index {
        std::fs::remove_file(&index_path).map_err(|e| gribfetch_fs::Error::write(&index_path, e))?;
    }

    Ok(resolution)
}

fn sibling_index(payload: &Path) -> PathBuf {
    let mut name = payload.as_os_str().to_os_string();
    name.push(".idx");
    PathBuf::from(name)
}
