use crate::error::{LockFileError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An exclusively held lock file.
///
/// While a `LockFile` is held, no other `LockFile` can be acquired for the
/// same path, whether from this process or another one. The lock is given
/// up by [`release`](Self::release) or, at the latest, when the value is
/// dropped. The file itself stays on disk.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the LockFile is dropped"]
pub struct LockFile {
    file: Option<File>,
    path: PathBuf,
}

impl LockFile {
    /// Wrap a file that has already been opened exclusively.
    ///
    /// No I/O is performed; the caller vouches for the exclusivity of `file`.
    pub fn from_file(file: File, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(LockFileError::invalid_argument("lock file path is empty"));
        }

        Ok(LockFile {
            file: Some(file),
            path,
        })
    }

    /// Get the lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open lock file, `None` once released
    pub fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Give up the lock. Calling this again after the first call does nothing.
    ///
    /// The file handle is closed even when unlocking reports an error, so the
    /// lock is relinquished either way.
    pub fn release(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        let unlocked = unlock(&file);
        drop(file);

        match unlocked {
            Ok(()) => {
                debug!("Lock released (file persists): {}", self.path.display());
                Ok(())
            }
            Err(e) => Err(LockFileError::Release {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(unix)]
fn unlock(file: &File) -> std::io::Result<()> {
    fs2::FileExt::unlock(file)
}

// Share-mode exclusivity ends when the handle closes
#[cfg(not(unix))]
fn unlock(_file: &File) -> std::io::Result<()> {
    Ok(())
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            // The handle is closed regardless, never panic here
            warn!("{} (non-fatal, handle closed)", e);
        }
    }
}
