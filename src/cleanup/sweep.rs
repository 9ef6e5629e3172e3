//! Detection and periodic sweeping of finished workspaces

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::action::CleanupAction;
use super::config::CleanupConfig;
use super::executor::CleanupExecutor;
use super::queue::{CleanupQueue, CleanupRequest};
use crate::abstractions::WorkItemState;

/// A tracked workspace whose work item may have finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCandidate {
    pub key: String,
    pub poll_id: String,
    pub tmux_session: String,
    pub clone_path: PathBuf,
    pub source_url: String,
    pub source_type: String,
}

impl CleanupCandidate {
    fn into_request(self, reason: String) -> CleanupRequest {
        CleanupRequest {
            key: self.key,
            poll_id: self.poll_id,
            reason,
            tmux_session: self.tmux_session,
            clone_path: self.clone_path,
            source_url: self.source_url,
            source_type: self.source_type,
        }
    }
}

/// Totals for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub processed: usize,
    pub removed: usize,
    pub retained: usize,
    pub action_failures: usize,
}

pub struct CleanupSweeper {
    queue: CleanupQueue,
    executor: CleanupExecutor,
    state: Arc<dyn WorkItemState>,
}

impl CleanupSweeper {
    pub fn new(
        queue: CleanupQueue,
        executor: CleanupExecutor,
        state: Arc<dyn WorkItemState>,
    ) -> Self {
        Self {
            queue,
            executor,
            state,
        }
    }

    pub fn queue(&self) -> &CleanupQueue {
        &self.queue
    }

    /// Ask the tracker about `candidate` and enqueue it when `config` says so
    ///
    /// Returns `None` when nothing should happen, otherwise whether a new
    /// queue entry was created.
    pub async fn evaluate(
        &self,
        candidate: CleanupCandidate,
        config: &CleanupConfig,
    ) -> Result<Option<bool>> {
        if !config.enabled {
            debug!(key = %candidate.key, "Cleanup disabled");
            return Ok(None);
        }

        let check = self
            .state
            .check_state(&candidate.source_type, &candidate.source_url)
            .await
            .with_context(|| format!("Failed to check state of {}", candidate.source_url))?;

        let reason = match check.reason {
            Some(reason) if check.should_cleanup && config.is_actionable(Some(reason)) => reason,
            _ => {
                debug!(key = %candidate.key, ?check, "Work item not actionable");
                return Ok(None);
            }
        };

        let added = self
            .queue
            .add(
                candidate.into_request(reason.to_string()),
                &config.delay,
            )
            .await?;
        Ok(Some(added))
    }

    /// Run `actions` for every ready item
    ///
    /// Items whose report contains a refusal stay queued for a later or
    /// manual pass; everything else is removed, including items whose
    /// actions failed.
    pub async fn sweep(&self, actions: &[CleanupAction]) -> Result<SweepSummary> {
        let ready = self
            .queue
            .get_ready()
            .await
            .context("Failed to read cleanup queue")?;

        let mut summary = SweepSummary::default();
        for item in ready {
            summary.processed += 1;
            info!(key = %item.key, reason = %item.reason, "Cleaning up workspace");

            let report = self
                .executor
                .execute_all(&item.tmux_session, &item.clone_path, actions)
                .await;
            summary.action_failures += report.failure_count();

            if report.has_refusals() {
                warn!(key = %item.key, "Cleanup refused, keeping item queued");
                summary.retained += 1;
                continue;
            }

            match self.queue.remove(&item.key).await {
                Ok(_) => summary.removed += 1,
                Err(e) => {
                    error!(key = %item.key, error = %e, "Failed to dequeue cleaned item");
                    summary.retained += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            removed = summary.removed,
            retained = summary.retained,
            failures = summary.action_failures,
            "Cleanup sweep finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstractions::{
        MockContainers, MockGitStatus, MockSessions, MockWorkItemState, StateCheck,
    };
    use crate::cleanup::CleanupReason;
    use crate::config::PortRange;
    use crate::ports::{MockPortProbe, PortAllocator};
    use crate::storage::LockPolicy;
    use tempfile::TempDir;

    const PR: &str = "https://github.com/acme/api/pull/12";

    struct Fixture {
        state_dir: TempDir,
        clones: TempDir,
        work_items: MockWorkItemState,
        git: MockGitStatus,
        containers: MockContainers,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                state_dir: TempDir::new().unwrap(),
                clones: TempDir::new().unwrap(),
                work_items: MockWorkItemState::new(),
                git: MockGitStatus::new(),
                containers: MockContainers::new(),
            }
        }

        fn sweeper(&self) -> CleanupSweeper {
            let ports = PortAllocator::with_probe(
                self.state_dir.path().join("ports.json"),
                PortRange::new(19200, 19210),
                LockPolicy::default(),
                Arc::new(MockPortProbe::free()),
            );
            let executor = CleanupExecutor::new(
                self.clones.path(),
                ports,
                Arc::new(MockSessions::default()),
                Arc::new(self.containers.clone()),
                Arc::new(self.git.clone()),
            );
            let queue = CleanupQueue::at(
                self.state_dir.path().join("cleanup-queue.json"),
                LockPolicy::default(),
            );
            CleanupSweeper::new(queue, executor, Arc::new(self.work_items.clone()))
        }

        fn candidate(&self, key: &str) -> CleanupCandidate {
            let clone_path = self.clones.path().join(key);
            std::fs::create_dir_all(&clone_path).unwrap();
            CleanupCandidate {
                key: key.to_string(),
                poll_id: "github-prs".to_string(),
                tmux_session: String::new(),
                clone_path,
                source_url: PR.to_string(),
                source_type: "github_pr".to_string(),
            }
        }
    }

    #[tokio::test]
    async fn test_evaluate_enqueues_merged_item_once() {
        let fx = Fixture::new();
        fx.work_items.set(PR, StateCheck::finished(CleanupReason::Merged));
        let sweeper = fx.sweeper();
        let config = CleanupConfig::default();

        let first = sweeper.evaluate(fx.candidate("api-pr-12"), &config).await.unwrap();
        let second = sweeper.evaluate(fx.candidate("api-pr-12"), &config).await.unwrap();

        assert_eq!(first, Some(true));
        assert_eq!(second, Some(false));
        let items = sweeper.queue().list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].reason, "merged");
    }

    #[tokio::test]
    async fn test_evaluate_ignores_open_or_unlisted_reasons() {
        let fx = Fixture::new();
        let sweeper = fx.sweeper();

        let open = sweeper
            .evaluate(fx.candidate("open"), &CleanupConfig::default())
            .await
            .unwrap();
        assert_eq!(open, None);

        fx.work_items.set(PR, StateCheck::finished(CleanupReason::Closed));
        let merged_only = CleanupConfig {
            on: vec![CleanupReason::Merged],
            ..CleanupConfig::default()
        };
        let closed = sweeper.evaluate(fx.candidate("closed"), &merged_only).await.unwrap();
        assert_eq!(closed, None);

        let disabled = CleanupConfig {
            enabled: false,
            ..CleanupConfig::default()
        };
        assert_eq!(
            sweeper.evaluate(fx.candidate("off"), &disabled).await.unwrap(),
            None
        );
        assert!(sweeper.queue().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_removes_cleaned_items_and_skips_pending() {
        let fx = Fixture::new();
        fx.work_items.set(PR, StateCheck::finished(CleanupReason::Merged));
        let sweeper = fx.sweeper();

        sweeper
            .evaluate(fx.candidate("ready"), &CleanupConfig::immediate())
            .await
            .unwrap();
        sweeper
            .evaluate(fx.candidate("pending"), &CleanupConfig::default())
            .await
            .unwrap();

        let summary = sweeper.sweep(&[CleanupAction::RemoveClone]).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.removed, 1);
        assert!(!fx.clones.path().join("ready").exists());
        assert!(fx.clones.path().join("pending").exists());
        assert!(!sweeper.queue().is_queued("ready").await.unwrap());
        assert!(sweeper.queue().is_queued("pending").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_keeps_refused_items_queued() {
        let fx = Fixture::new();
        fx.work_items.set(PR, StateCheck::finished(CleanupReason::Merged));
        let sweeper = fx.sweeper();

        let candidate = fx.candidate("dirty");
        fx.git
            .mark_dirty(&std::fs::canonicalize(&candidate.clone_path).unwrap());
        sweeper
            .evaluate(candidate, &CleanupConfig::immediate())
            .await
            .unwrap();

        let summary = sweeper.sweep(&[CleanupAction::RemoveClone]).await.unwrap();

        assert_eq!(summary.retained, 1);
        assert_eq!(summary.removed, 0);
        assert!(fx.clones.path().join("dirty").exists());
        assert!(sweeper.queue().is_queued("dirty").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_removes_items_whose_actions_failed() {
        let mut fx = Fixture::new();
        fx.containers = MockContainers::failing("docker daemon unavailable");
        fx.work_items.set(PR, StateCheck::finished(CleanupReason::Closed));
        let sweeper = fx.sweeper();

        sweeper
            .evaluate(fx.candidate("broken"), &CleanupConfig::immediate())
            .await
            .unwrap();
        let summary = sweeper
            .sweep(&[CleanupAction::KillSession, CleanupAction::StopContainer])
            .await
            .unwrap();

        assert_eq!(summary.action_failures, 1);
        assert_eq!(summary.removed, 1);
        assert!(!sweeper.queue().is_queued("broken").await.unwrap());
    }
}
