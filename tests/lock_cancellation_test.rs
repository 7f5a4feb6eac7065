use lockfile::{CancellationToken, LockFile, LockFileError, PollConfig};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[test]
fn test_wait_canceled_after_timeout() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("test.lock");

    let _holder = LockFile::try_acquire(&lock_path).unwrap().unwrap();

    let start = Instant::now();
    let token = CancellationToken::with_timeout(Duration::from_millis(500));
    let result = LockFile::wait_acquire(&lock_path, Some(&token));
    let elapsed = start.elapsed();

    match result {
        Err(LockFileError::Canceled { path }) => assert_eq!(path, lock_path),
        other => panic!("Expected Canceled, got: {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(1500));
}

#[test]
fn test_busy_wait_canceled_after_timeout() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("test.lock");

    let _holder = LockFile::try_acquire(&lock_path).unwrap().unwrap();

    let start = Instant::now();
    let token = CancellationToken::with_timeout(Duration::from_millis(200));
    let err = LockFile::wait_acquire_with(&lock_path, Some(&token), &PollConfig::busy())
        .unwrap_err();

    assert!(err.is_canceled());
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[test]
fn test_already_canceled_token_fails_immediately() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("test.lock");

    let token = CancellationToken::new();
    token.cancel();

    // Even a free lock is not taken once canceled
    let err = LockFile::wait_acquire(&lock_path, Some(&token)).unwrap_err();
    assert!(err.is_canceled());
    assert!(!lock_path.exists(), "No attempt should have been made");
}

#[test]
fn test_cancel_from_another_thread() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("test.lock");

    let _holder = LockFile::try_acquire(&lock_path).unwrap().unwrap();

    let token = CancellationToken::new();
    let remote = token.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        remote.cancel();
    });

    let start = Instant::now();
    let err = LockFile::wait_acquire(&lock_path, Some(&token)).unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_canceled());
    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_secs(2));

    canceller.join().unwrap();
}

#[test]
fn test_slow_poll_does_not_oversleep_deadline() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("test.lock");

    let _holder = LockFile::try_acquire(&lock_path).unwrap().unwrap();

    let poll = PollConfig::new()
        .with_initial_interval(Duration::from_secs(10))
        .with_max_interval(Duration::from_secs(10));
    let start = Instant::now();
    let token = CancellationToken::with_timeout(Duration::from_millis(300));
    let err = LockFile::wait_acquire_with(&lock_path, Some(&token), &poll).unwrap_err();

    assert!(err.is_canceled());
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_cancellation_leaves_held_lock_alone() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("test.lock");
    let other_path = temp.path().join("other.lock");

    let token = CancellationToken::new();
    let other = LockFile::wait_acquire(&other_path, Some(&token)).unwrap();
    let _holder = LockFile::try_acquire(&lock_path).unwrap().unwrap();

    token.cancel();
    let err = LockFile::wait_acquire(&lock_path, Some(&token)).unwrap_err();
    assert!(err.is_canceled());

    assert!(other.is_held());
    assert!(LockFile::try_acquire(&other_path).unwrap().is_none());
}
