//! Persistent queue of workspaces waiting to be torn down

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::delay::parse_delay_secs;
use crate::config::OcdcConfig;
use crate::error::OcdcResult;
use crate::storage::{LockPolicy, LockedStore};

/// What the caller knows about a finished workspace when enqueueing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRequest {
    pub key: String,
    pub poll_id: String,
    pub reason: String,
    pub tmux_session: String,
    pub clone_path: PathBuf,
    pub source_url: String,
    pub source_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupQueueItem {
    pub key: String,
    pub poll_id: String,
    pub reason: String,
    pub queued_at: DateTime<Utc>,
    pub cleanup_after: DateTime<Utc>,
    pub tmux_session: String,
    pub clone_path: PathBuf,
    pub source_url: String,
    pub source_type: String,
}

impl CleanupQueueItem {
    pub fn is_ready_at(&self, now: DateTime<Utc>) -> bool {
        self.cleanup_after <= now
    }
}

/// Persisted `cleanup-queue.json` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupQueueFile {
    #[serde(default)]
    pub items: Vec<CleanupQueueItem>,
}

#[derive(Debug, Clone)]
pub struct CleanupQueue {
    store: LockedStore<CleanupQueueFile>,
}

impl CleanupQueue {
    pub fn new(config: &OcdcConfig) -> Self {
        Self::at(config.cleanup_queue_path(), config.lock.clone())
    }

    pub fn at(path: impl Into<PathBuf>, policy: LockPolicy) -> Self {
        Self {
            store: LockedStore::new(path, policy),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Enqueue a cleanup to run after `delay`
    ///
    /// Returns `false` without touching the queue when the key is already
    /// queued; the first request for a key wins.
    pub async fn add(&self, request: CleanupRequest, delay: &str) -> OcdcResult<bool> {
        let delay_secs = parse_delay_secs(delay);
        self.store
            .update(move |queue| {
                if queue.items.iter().any(|item| item.key == request.key) {
                    debug!(key = %request.key, "Cleanup already queued");
                    return Ok(false);
                }

                let queued_at = Utc::now();
                let cleanup_after = i64::try_from(delay_secs)
                    .ok()
                    .and_then(ChronoDuration::try_seconds)
                    .and_then(|delay| queued_at.checked_add_signed(delay))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);

                info!(
                    key = %request.key,
                    reason = %request.reason,
                    cleanup_after = %cleanup_after.to_rfc3339(),
                    "Queued workspace cleanup"
                );
                queue.items.push(CleanupQueueItem {
                    key: request.key,
                    poll_id: request.poll_id,
                    reason: request.reason,
                    queued_at,
                    cleanup_after,
                    tmux_session: request.tmux_session,
                    clone_path: request.clone_path,
                    source_url: request.source_url,
                    source_type: request.source_type,
                });
                Ok(true)
            })
            .await
    }

    /// Drop `key` from the queue; returns whether it was present
    pub async fn remove(&self, key: &str) -> OcdcResult<bool> {
        let key = key.to_string();
        self.store
            .update(move |queue| {
                let before = queue.items.len();
                queue.items.retain(|item| item.key != key);
                let removed = queue.items.len() != before;
                if removed {
                    info!(key = %key, "Removed queued cleanup");
                }
                Ok(removed)
            })
            .await
    }

    /// Items whose delay has elapsed
    pub async fn get_ready(&self) -> OcdcResult<Vec<CleanupQueueItem>> {
        let now = Utc::now();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|item| item.is_ready_at(now))
            .collect())
    }

    pub async fn is_queued(&self, key: &str) -> OcdcResult<bool> {
        Ok(self.list().await?.iter().any(|item| item.key == key))
    }

    pub async fn list(&self) -> OcdcResult<Vec<CleanupQueueItem>> {
        Ok(self.store.load().await?.items)
    }
}
