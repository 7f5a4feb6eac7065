use super::cancel::CancellationToken;
use super::handle::LockFile;
use super::poll::PollConfig;
use crate::error::{LockFileError, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::thread;
use tracing::{debug, trace};

// ERROR_SHARING_VIOLATION: the file is open elsewhere with an incompatible share mode
#[cfg(windows)]
const ERROR_SHARING_VIOLATION: i32 = 32;
// ERROR_LOCK_VIOLATION: a region of the file is locked by another process
#[cfg(windows)]
const ERROR_LOCK_VIOLATION: i32 = 33;

/// Check if an I/O error means the lock file is held by someone else.
///
/// `flock(LOCK_EX | LOCK_NB)` reports a held lock as `EWOULDBLOCK` (`EAGAIN`
/// on most systems). Every other error is a real failure and must not be
/// retried.
#[cfg(unix)]
fn is_lock_contention(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    matches!(e.raw_os_error(), Some(code) if code == libc::EWOULDBLOCK || code == libc::EAGAIN)
}

#[cfg(windows)]
fn is_lock_contention(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(ERROR_SHARING_VIOLATION) | Some(ERROR_LOCK_VIOLATION)
    )
}

fn validate_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(LockFileError::invalid_argument("lock file path is empty"));
    }
    Ok(())
}

/// Open-or-create `path` read/write and claim it exclusively.
///
/// POSIX has no share modes, so exclusivity comes from a non-blocking
/// `flock` taken right after the open. `flock` belongs to the open file
/// description, so a second open from this same process contends as well.
#[cfg(unix)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    fs2::FileExt::try_lock_exclusive(&file)?;
    Ok(file)
}

/// Open-or-create `path` read/write with share mode none, so the open itself
/// fails for every other opener while the handle lives.
#[cfg(windows)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .share_mode(0)
        .open(path)
}

impl LockFile {
    /// Make a single attempt to acquire the lock file at `path`.
    ///
    /// Returns `Ok(None)` when another owner holds the lock. The file is
    /// created if it does not exist and is never truncated or written.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        validate_path(path)?;

        match open_exclusive(path) {
            Ok(file) => {
                debug!("Lock acquired: {}", path.display());
                LockFile::from_file(file, path).map(Some)
            }
            Err(e) if is_lock_contention(&e) => {
                trace!("Lock contended: {}", path.display());
                Ok(None)
            }
            Err(e) => Err(LockFileError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Block until the lock file at `path` is acquired or `cancel` fires.
    ///
    /// Uses [`PollConfig::default`] between attempts.
    pub fn wait_acquire(
        path: impl AsRef<Path>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Self> {
        Self::wait_acquire_with(path, cancel, &PollConfig::default())
    }

    /// Block until the lock file at `path` is acquired or `cancel` fires,
    /// pacing attempts according to `poll`.
    ///
    /// Cancellation is checked before every attempt; an attempt already in
    /// progress is never interrupted. I/O failures other than contention end
    /// the wait immediately.
    pub fn wait_acquire_with(
        path: impl AsRef<Path>,
        cancel: Option<&CancellationToken>,
        poll: &PollConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        validate_path(path)?;

        debug!("Waiting for lock: {} (poll: {:?})", path.display(), poll);

        let mut backoff = poll.backoff();
        let mut rng = rand::thread_rng();
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                debug!(
                    "Wait for lock canceled after {} attempt(s): {}",
                    attempts,
                    path.display()
                );
                return Err(LockFileError::canceled(path));
            }

            attempts += 1;
            if let Some(lock) = Self::try_acquire(path)? {
                debug!("Lock acquired after {} attempt(s)", attempts);
                return Ok(lock);
            }

            // Don't oversleep a deadline, the next check must see it promptly
            let mut delay = backoff.next_delay(&mut rng);
            if let Some(remaining) = cancel.and_then(|c| c.remaining()) {
                delay = delay.min(remaining);
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }
}
