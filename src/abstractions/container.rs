//! Devcontainer lifecycle

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::subprocess::{ProcessCommand, SubprocessManager};

/// Stops the dev environment attached to a workspace
#[async_trait]
pub trait ContainerLifecycle: Send + Sync {
    /// Stop every container belonging to `clone_path`; stopping nothing is success
    async fn stop(&self, clone_path: &Path) -> Result<()>;
}

/// Finds devcontainers by the `devcontainer.local_folder` label and stops them
pub struct DockerContainers {
    subprocess: SubprocessManager,
}

impl DockerContainers {
    pub fn new(subprocess: SubprocessManager) -> Self {
        Self { subprocess }
    }

    async fn container_ids(&self, clone_path: &Path) -> Result<Vec<String>> {
        let filter = format!("label=devcontainer.local_folder={}", clone_path.display());
        let command = ProcessCommand::new("docker").args(["ps", "-q", "--filter", &filter]);

        let output = self
            .subprocess
            .run(command)
            .await
            .context("Failed to execute docker ps")?;

        if !output.status.success() {
            bail!("docker ps failed: {}", output.stderr.trim());
        }

        Ok(output.stdout_lines().map(str::to_string).collect())
    }
}

#[async_trait]
impl ContainerLifecycle for DockerContainers {
    async fn stop(&self, clone_path: &Path) -> Result<()> {
        let ids = self.container_ids(clone_path).await?;
        if ids.is_empty() {
            debug!("No running container for {}", clone_path.display());
            return Ok(());
        }

        let command = ProcessCommand::new("docker").arg("stop").args(&ids);
        let output = self
            .subprocess
            .run(command)
            .await
            .context("Failed to execute docker stop")?;

        if !output.status.success() {
            bail!("docker stop failed: {}", output.stderr.trim());
        }

        info!(
            "Stopped {} container(s) for {}",
            ids.len(),
            clone_path.display()
        );
        Ok(())
    }
}

/// Records stop requests; optionally fails them
#[derive(Clone, Default)]
pub struct MockContainers {
    stopped: Arc<Mutex<Vec<PathBuf>>>,
    fail_with: Option<String>,
}

impl MockContainers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            stopped: Arc::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn stopped(&self) -> Vec<PathBuf> {
        self.stopped
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ContainerLifecycle for MockContainers {
    async fn stop(&self, clone_path: &Path) -> Result<()> {
        if let Some(message) = &self.fail_with {
            bail!("{message}");
        }
        self.stopped
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(clone_path.to_path_buf());
        Ok(())
    }
}
