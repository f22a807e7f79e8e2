use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A small shared file held under an exclusive advisory lock.
///
/// The lock is released when the value is dropped. Content is rewritten in
/// place on the locked handle and never replaced by rename, so every process
/// contends on the same inode.
pub struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    fn open(path: &Path) -> Result<File> {
        crate::ensure_parent(path)?;
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::write(path, e))
    }

    /// Block until the exclusive lock is held.
    pub fn open_locked(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = Self::open(path)?;
        file.lock_exclusive().map_err(|e| Error::write(path, e))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the exclusive lock without blocking.
    ///
    /// Returns [`Error::Locked`] when another handle holds it.
    pub fn try_open_locked(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = Self::open(path)?;
        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
                || e.kind() == std::io::ErrorKind::WouldBlock
            {
                return Err(Error::Locked {
                    path: path.to_path_buf(),
                });
            }
            return Err(Error::write(path, e));
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_end(&mut buf))
            .map_err(|e| Error::read(&self.path, e))?;
        Ok(buf)
    }

    pub fn overwrite(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.write_all(data))
            .and_then(|_| self.file.set_len(data.len() as u64))
            .and_then(|_| self.file.flush())
            .map_err(|e| Error::write(&self.path, e))
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.lock");
        let locked = LockedFile::open_locked(&path).unwrap();
        assert!(path.exists());
        assert_eq!(locked.path(), path);
    }

    #[test]
    fn test_try_lock_contended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.lock");
        let _held = LockedFile::open_locked(&path).unwrap();
        let err = LockedFile::try_open_locked(&path).err().unwrap();
        assert!(matches!(err, Error::Locked { .. }));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.lock");
        {
            let _held = LockedFile::open_locked(&path).unwrap();
        }
        assert!(LockedFile::try_open_locked(&path).is_ok());
    }

    #[test]
    fn test_overwrite_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.lock");
        let mut locked = LockedFile::open_locked(&path).unwrap();
        locked.overwrite(b"1700000000.123456").unwrap();
        locked.overwrite(b"42").unwrap();
        assert_eq!(locked.read().unwrap(), b"42");
        drop(locked);
        assert_eq!(std::fs::read(&path).unwrap(), b"42");
    }

    #[test]
    fn test_read_empty() {
        let dir = tempdir().unwrap();
        let mut locked = LockedFile::open_locked(dir.path().join("new.lock")).unwrap();
        assert!(locked.read().unwrap().is_empty());
    }
}
