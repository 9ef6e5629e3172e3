//! Git working-copy status

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::subprocess::{ProcessCommand, SubprocessManager};

/// Reports whether deleting a working copy would lose work
#[async_trait]
pub trait GitStatus: Send + Sync {
    /// True when there are uncommitted, staged, or unpushed changes
    async fn is_dirty_or_unpushed(&self, path: &Path) -> Result<bool>;
}

/// `git` command-line implementation
pub struct GitCli {
    subprocess: SubprocessManager,
}

impl GitCli {
    pub fn new(subprocess: SubprocessManager) -> Self {
        Self { subprocess }
    }
}

#[async_trait]
impl GitStatus for GitCli {
    async fn is_dirty_or_unpushed(&self, path: &Path) -> Result<bool> {
        let status = self
            .subprocess
            .run(
                ProcessCommand::new("git")
                    .current_dir(path)
                    .args(["status", "--porcelain"]),
            )
            .await
            .context("Failed to execute git status")?;

        if !status.status.success() {
            bail!(
                "git status failed in {}: {}",
                path.display(),
                status.stderr.trim()
            );
        }

        if !status.stdout.trim().is_empty() {
            debug!("{} has uncommitted changes", path.display());
            return Ok(true);
        }

        let ahead = self
            .subprocess
            .run(
                ProcessCommand::new("git")
                    .current_dir(path)
                    .args(["rev-list", "--count", "@{upstream}..HEAD"]),
            )
            .await
            .context("Failed to execute git rev-list")?;

        if !ahead.status.success() {
            // No upstream: nothing guarantees the commits exist anywhere else
            debug!("{} has no upstream branch", path.display());
            return Ok(true);
        }

        let count: u64 = ahead
            .stdout
            .trim()
            .parse()
            .with_context(|| format!("Unexpected git rev-list output: {:?}", ahead.stdout))?;
        if count > 0 {
            debug!("{} is {} commit(s) ahead of upstream", path.display(), count);
        }
        Ok(count > 0)
    }
}

/// In-memory status keyed by path
#[derive(Clone, Default)]
pub struct MockGitStatus {
    dirty: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockGitStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&self, path: &Path) {
        self.dirty
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_path_buf());
    }
}

#[async_trait]
impl GitStatus for MockGitStatus {
    async fn is_dirty_or_unpushed(&self, path: &Path) -> Result<bool> {
        Ok(self
            .dirty
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path))
    }
}
