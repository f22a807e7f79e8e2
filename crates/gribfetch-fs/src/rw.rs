use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub sync: bool,
    pub create_parents: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
    pub fn create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent(path: impl AsRef<Path>) -> Result<()> {
    let parent = parent_dir(path.as_ref());
    if parent.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))
}

/// Sibling path used to stage content before it is renamed over `path`.
pub fn staging_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    parent_dir(path).join(format!(".{name}.{}.part", uuid::Uuid::new_v4()))
}

pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: Options) -> Result<()> {
    let path = path.as_ref();
    if options.create_parents {
        ensure_parent(path)?;
    }

    let tmp_path = staging_path(path);

    fs::write(&tmp_path, content).map_err(|e| Error::write(&tmp_path, e))?;

    if options.sync {
        let file = fs::File::open(&tmp_path).map_err(|e| Error::write(&tmp_path, e))?;
        file.sync_all().map_err(|e| Error::write(&tmp_path, e))?;
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::write(path, e)
    })?;

    Ok(())
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::read(path, e))
}
