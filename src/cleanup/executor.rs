//! Runs cleanup actions against a finished workspace

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::action::CleanupAction;
use crate::abstractions::{ContainerLifecycle, GitStatus, SessionManager};
use crate::ports::PortAllocator;

/// Result of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ActionOutcome {
    Completed,
    /// Nothing to do (session or clone already gone)
    Skipped,
    Failed(String),
    /// A safety gate stopped the action; never counts as success
    Refused(String),
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Completed => f.write_str("completed"),
            ActionOutcome::Skipped => f.write_str("skipped"),
            ActionOutcome::Failed(msg) => write!(f, "failed: {msg}"),
            ActionOutcome::Refused(reason) => write!(f, "refused: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub action: CleanupAction,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

/// Per-action outcomes of one [`CleanupExecutor::execute_all`] call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub results: Vec<ActionResult>,
}

impl CleanupReport {
    fn record(&mut self, action: CleanupAction, outcome: ActionOutcome) {
        self.results.push(ActionResult { action, outcome });
    }

    pub fn outcome(&self, action: CleanupAction) -> Option<&ActionOutcome> {
        self.results
            .iter()
            .find(|result| result.action == action)
            .map(|result| &result.outcome)
    }

    pub fn has_refusals(&self) -> bool {
        self.results
            .iter()
            .any(|result| matches!(result.outcome, ActionOutcome::Refused(_)))
    }

    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| matches!(result.outcome, ActionOutcome::Failed(_)))
            .count()
    }
}

/// Tears workspaces down through the collaborator traits
#[derive(Clone)]
pub struct CleanupExecutor {
    clones_root: PathBuf,
    ports: PortAllocator,
    sessions: Arc<dyn SessionManager>,
    containers: Arc<dyn ContainerLifecycle>,
    git: Arc<dyn GitStatus>,
}

impl CleanupExecutor {
    pub fn new(
        clones_root: impl Into<PathBuf>,
        ports: PortAllocator,
        sessions: Arc<dyn SessionManager>,
        containers: Arc<dyn ContainerLifecycle>,
        git: Arc<dyn GitStatus>,
    ) -> Self {
        Self {
            clones_root: clones_root.into(),
            ports,
            sessions,
            containers,
            git,
        }
    }

    /// Run every action in order; a failing action never stops the next one
    pub async fn execute_all(
        &self,
        session: &str,
        clone_path: &Path,
        actions: &[CleanupAction],
    ) -> CleanupReport {
        let mut report = CleanupReport::default();
        for &action in actions {
            let outcome = match action {
                CleanupAction::KillSession => self.kill_session(session).await,
                CleanupAction::StopContainer => self.stop_container(clone_path).await,
                CleanupAction::RemoveClone => self.remove_clone(clone_path).await,
            };
            debug!(action = %action, outcome = %outcome, "Cleanup action finished");
            report.record(action, outcome);
        }
        report
    }

    async fn kill_session(&self, session: &str) -> ActionOutcome {
        if session.is_empty() {
            return ActionOutcome::Skipped;
        }

        match self.sessions.session_exists(session).await {
            Ok(false) => {
                debug!(session, "Session already gone");
                ActionOutcome::Skipped
            }
            Ok(true) => match self.sessions.kill_session(session).await {
                Ok(()) => {
                    info!(session, "Killed session");
                    ActionOutcome::Completed
                }
                Err(e) => {
                    error!(session, error = %format!("{e:#}"), "Failed to kill session");
                    ActionOutcome::Failed(format!("{e:#}"))
                }
            },
            Err(e) => {
                error!(session, error = %format!("{e:#}"), "Failed to query session");
                ActionOutcome::Failed(format!("{e:#}"))
            }
        }
    }

    async fn stop_container(&self, clone_path: &Path) -> ActionOutcome {
        if !clone_path.exists() {
            debug!(path = %clone_path.display(), "Clone missing, no container to stop");
            return self.release_orphaned_port(clone_path).await;
        }

        if let Err(e) = self.containers.stop(clone_path).await {
            error!(path = %clone_path.display(), error = %format!("{e:#}"), "Failed to stop container");
            return ActionOutcome::Failed(format!("{e:#}"));
        }

        self.release_port(clone_path).await
    }

    async fn remove_clone(&self, clone_path: &Path) -> ActionOutcome {
        let Ok(target) = std::fs::canonicalize(clone_path) else {
            debug!(path = %clone_path.display(), "Clone already removed");
            return self.release_orphaned_port(clone_path).await;
        };

        let root = match std::fs::canonicalize(&self.clones_root) {
            Ok(root) => root,
            Err(e) => {
                let reason = format!(
                    "clones root {} is not accessible: {e}",
                    self.clones_root.display()
                );
                error!(path = %target.display(), "Refusing to remove clone: {}", reason);
                return ActionOutcome::Refused(reason);
            }
        };

        if target == root || !target.starts_with(&root) {
            let reason = format!(
                "{} is not inside clones root {}",
                target.display(),
                root.display()
            );
            error!("Refusing to remove clone: {}", reason);
            return ActionOutcome::Refused(reason);
        }

        match self.git.is_dirty_or_unpushed(&target).await {
            Ok(false) => {}
            Ok(true) => {
                let reason = format!("{} has uncommitted or unpushed changes", target.display());
                warn!("Refusing to remove clone: {}", reason);
                return ActionOutcome::Refused(reason);
            }
            Err(e) => {
                // Unknown status counts as dirty
                let reason = format!("could not inspect {}: {e:#}", target.display());
                warn!("Refusing to remove clone: {}", reason);
                return ActionOutcome::Refused(reason);
            }
        }

        if let Err(e) = tokio::fs::remove_dir_all(&target).await {
            error!(path = %target.display(), error = %e, "Failed to remove clone");
            return ActionOutcome::Failed(format!("removing {}: {e}", target.display()));
        }
        info!(path = %target.display(), "Removed clone");

        if let Some(parent) = target.parent() {
            if parent != root && parent.starts_with(&root) && is_empty_dir(parent).await {
                match tokio::fs::remove_dir(parent).await {
                    Ok(()) => debug!(path = %parent.display(), "Removed empty parent directory"),
                    Err(e) => debug!(path = %parent.display(), error = %e, "Kept parent directory"),
                }
            }
        }

        self.release_port(&target).await
    }

    async fn release_port(&self, clone_path: &Path) -> ActionOutcome {
        match self.ports.release(clone_path).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => {
                error!(path = %clone_path.display(), error = %e, "Failed to release port");
                ActionOutcome::Failed(format!("releasing port: {e}"))
            }
        }
    }

    /// Drop the port entry of a clone that no longer exists on disk
    async fn release_orphaned_port(&self, clone_path: &Path) -> ActionOutcome {
        match self.ports.release(clone_path).await {
            Ok(true) => {
                info!(path = %clone_path.display(), "Released port of missing clone");
                ActionOutcome::Completed
            }
            Ok(false) => ActionOutcome::Skipped,
            Err(e) => {
                error!(path = %clone_path.display(), error = %e, "Failed to release port");
                ActionOutcome::Failed(format!("releasing port: {e}"))
            }
        }
    }
}

async fn is_empty_dir(path: &Path) -> bool {
    match tokio::fs::read_dir(path).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
        Err(_) => false,
    }
}
