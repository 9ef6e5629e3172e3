//! Cross-process locking built on atomic directory creation
//!
//! A lock for `<resource>` is the directory `<resource>.lock`. `mkdir` either
//! creates it or fails with `AlreadyExists`, so exactly one process wins.
//!
//! Stale-lock recovery is a heuristic: a lock directory older than
//! [`LockPolicy::stale_after`] is assumed to belong to a crashed holder and
//! is removed. This assumes negligible clock skew between processes sharing
//! the directory and that holders finish well inside the threshold.
//!
//! Reclaiming renames the stale directory to a unique tombstone before
//! deleting it, so two waiters that saw the same stale lock cannot both
//! remove it. The tombstone is aged again after the rename; if it turns out
//! to be a fresh lock taken in between, it is renamed back. A third process
//! creating the lock inside that short window can still be displaced.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, trace, warn};

use crate::error::{OcdcError, OcdcResult};

/// Retry and staleness policy for [`FileLock`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockPolicy {
    /// Total time to keep retrying before giving up
    #[serde(with = "humantime_serde")]
    pub max_wait: Duration,
    /// Sleep between attempts while the lock is held by someone else
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,
    /// Age after which an existing lock is considered abandoned
    #[serde(with = "humantime_serde")]
    pub stale_after: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(30),
            retry_interval: Duration::from_millis(50),
            stale_after: Duration::from_secs(60),
        }
    }
}

/// A mutual-exclusion token shared between processes through the filesystem
#[derive(Debug, Clone)]
pub struct FileLock {
    lock_dir: PathBuf,
    policy: LockPolicy,
}

impl FileLock {
    /// Lock guarding `resource`; the lock directory is `<resource>.lock`
    pub fn for_resource(resource: &Path, policy: LockPolicy) -> Self {
        let mut name = OsString::from(resource.as_os_str());
        name.push(".lock");
        Self {
            lock_dir: PathBuf::from(name),
            policy,
        }
    }

    /// Path of the lock directory
    pub fn path(&self) -> &Path {
        &self.lock_dir
    }

    /// Block (asynchronously) until the lock is held or the wait budget runs out
    pub async fn acquire(&self) -> OcdcResult<FileLockGuard> {
        if let Some(parent) = self.lock_dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OcdcError::io(parent, e))?;
        }

        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match tokio::fs::create_dir(&self.lock_dir).await {
                Ok(()) => {
                    trace!(
                        lock = %self.lock_dir.display(),
                        attempts,
                        "Acquired lock"
                    );
                    return Ok(FileLockGuard {
                        lock_dir: self.lock_dir.clone(),
                        acquired: Instant::now(),
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if let Some(age) = lock_age(&self.lock_dir).await {
                        if age > self.policy.stale_after && self.reclaim_stale(age).await? {
                            continue;
                        }
                    }

                    if started.elapsed() >= self.policy.max_wait {
                        return Err(OcdcError::LockTimeout {
                            path: self.lock_dir.clone(),
                            waited: started.elapsed(),
                        });
                    }

                    tokio::time::sleep(self.policy.retry_interval).await;
                }
                Err(e) => {
                    return Err(OcdcError::Lock {
                        path: self.lock_dir.clone(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Move a stale lock aside and delete it
    ///
    /// Returns `true` when the caller should retry immediately, `false` when
    /// the lock turned out to be live and was put back.
    async fn reclaim_stale(&self, age: Duration) -> OcdcResult<bool> {
        let tombstone = self.tombstone_path();
        match tokio::fs::rename(&self.lock_dir, &tombstone).await {
            Ok(()) => {}
            // Another waiter already moved it
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => {
                return Err(OcdcError::Lock {
                    path: self.lock_dir.clone(),
                    source: e,
                })
            }
        }

        let still_stale = lock_age(&tombstone)
            .await
            .map_or(true, |current| current > self.policy.stale_after);
        if still_stale {
            warn!(
                lock = %self.lock_dir.display(),
                age_secs = age.as_secs(),
                "Removing stale lock left by a previous holder"
            );
            remove_lock_dir(&tombstone)?;
            return Ok(true);
        }

        match tokio::fs::rename(&tombstone, &self.lock_dir).await {
            Ok(()) => debug!(
                lock = %self.lock_dir.display(),
                "Lock was re-acquired meanwhile, restored it"
            ),
            Err(e) => {
                warn!(lock = %self.lock_dir.display(), error = %e, "Could not restore live lock");
                remove_lock_dir(&tombstone)?;
            }
        }
        Ok(false)
    }

    fn tombstone_path(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut name = OsString::from(self.lock_dir.as_os_str());
        name.push(format!(".stale-{}-{nanos}", std::process::id()));
        PathBuf::from(name)
    }

    /// Remove the lock directory; succeeds when it is already gone
    pub fn release(&self) -> OcdcResult<()> {
        remove_lock_dir(&self.lock_dir)
    }
}

/// Held lock; the directory is removed when the guard is dropped
#[derive(Debug)]
pub struct FileLockGuard {
    lock_dir: PathBuf,
    acquired: Instant,
    released: bool,
}

impl FileLockGuard {
    /// Explicitly release the lock, surfacing removal errors
    pub fn release(mut self) -> OcdcResult<()> {
        self.released = true;
        self.log_release();
        remove_lock_dir(&self.lock_dir)
    }

    fn log_release(&self) {
        trace!(
            lock = %self.lock_dir.display(),
            held_ms = self.acquired.elapsed().as_millis() as u64,
            "Releasing lock"
        );
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if !self.released {
            self.log_release();
            if let Err(e) = remove_lock_dir(&self.lock_dir) {
                warn!("Failed to release lock {}: {}", self.lock_dir.display(), e);
            }
        }
    }
}

fn remove_lock_dir(path: &Path) -> OcdcResult<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(lock = %path.display(), "Released lock");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OcdcError::io(path, e)),
    }
}

/// Age of the lock directory, or `None` if it vanished in the meantime
async fn lock_age(path: &Path) -> Option<Duration> {
    let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}
