//! Process-wide write lock.
//!
//! The sheet store has no isolation between concurrent appends, so every
//! header-check-then-append sequence runs while holding this lock. One lock
//! per deployment, shared by all requests.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("timed out after {0:?} waiting for the write lock")]
pub struct LockTimeout(pub Duration);

/// Cloning shares the same underlying lock.
#[derive(Clone, Default)]
pub struct WriteLock {
  inner: Arc<Mutex<()>>,
}

impl WriteLock {
  pub fn new() -> Self { Self::default() }

  /// Wait up to `timeout` for exclusive hold. No fairness is promised.
  pub async fn acquire(&self, timeout: Duration) -> Result<WriteGuard, LockTimeout> {
    match tokio::time::timeout(timeout, self.inner.clone().lock_owned()).await {
      Ok(held) => Ok(WriteGuard { held: Some(held) }),
      Err(_) => Err(LockTimeout(timeout)),
    }
  }

  pub fn is_held(&self) -> bool { self.inner.try_lock().is_err() }
}

/// Exclusive hold on a [`WriteLock`]. Dropping it releases the lock.
pub struct WriteGuard {
  held: Option<OwnedMutexGuard<()>>,
}

impl WriteGuard {
  /// Release now. Calling it again is a no-op.
  pub fn release(&mut self) {
    if self.held.take().is_some() {
      tracing::trace!("write lock released");
    }
  }
}

impl Drop for WriteGuard {
  fn drop(&mut self) { self.release(); }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SHORT: Duration = Duration::from_millis(50);

  #[tokio::test]
  async fn second_acquire_times_out_while_held() {
    let lock = WriteLock::new();
    let _guard = lock.acquire(SHORT).await.unwrap();

    let err = lock.acquire(SHORT).await.err().unwrap();
    assert_eq!(err, LockTimeout(SHORT));
  }

  #[tokio::test]
  async fn release_is_idempotent() {
    let lock = WriteLock::new();
    let mut guard = lock.acquire(SHORT).await.unwrap();
    assert!(lock.is_held());

    guard.release();
    guard.release();
    assert!(!lock.is_held());

    drop(guard);
    assert!(lock.acquire(SHORT).await.is_ok());
  }

  #[tokio::test]
  async fn clones_share_one_lock() {
    let lock = WriteLock::new();
    let other = lock.clone();
    let _guard = lock.acquire(SHORT).await.unwrap();
    assert!(other.acquire(SHORT).await.is_err());
  }

  #[tokio::test]
  async fn waiter_gets_lock_once_released() {
    let lock = WriteLock::new();
    let guard = lock.acquire(SHORT).await.unwrap();

    let waiter = {
      let lock = lock.clone();
      tokio::spawn(async move { lock.acquire(Duration::from_secs(5)).await.is_ok() })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(guard);

    assert!(waiter.await.unwrap());
  }
}
