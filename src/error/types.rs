use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockFileError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to open lock file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Waiting for lock on {path} was canceled")]
    Canceled { path: PathBuf },

    #[error("Failed to release lock on {path}: {source}")]
    Release { path: PathBuf, source: io::Error },
}

impl LockFileError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        LockFileError::InvalidArgument(message.into())
    }

    pub fn canceled(path: impl Into<PathBuf>) -> Self {
        LockFileError::Canceled { path: path.into() }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, LockFileError::Canceled { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, LockFileError::InvalidArgument(_))
    }

    /// The OS error behind an `Io` or `Release` failure
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            LockFileError::Io { source, .. } | LockFileError::Release { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LockFileError>;
