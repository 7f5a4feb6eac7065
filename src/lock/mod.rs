mod acquisition;
mod cancel;
mod handle;
mod poll;

pub use cancel::CancellationToken;
pub use handle::LockFile;
pub use poll::PollConfig;
