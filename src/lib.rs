//! Cross-process mutual exclusion backed by exclusively held lock files

pub mod error;
pub mod lock;

pub use error::{LockFileError, Result};
pub use lock::{CancellationToken, LockFile, PollConfig};
