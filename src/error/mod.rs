mod types;

pub use types::{LockFileError, Result};

// Re-export for convenience
pub use LockFileError as Error;
