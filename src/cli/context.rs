//! Wiring of configuration and production collaborators for CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::abstractions::{DockerContainers, GhCli, GitCli, Tmux};
use crate::cleanup::{CleanupExecutor, CleanupQueue, CleanupSweeper};
use crate::config::{load_config, OcdcConfig};
use crate::ports::PortAllocator;
use crate::subprocess::SubprocessManager;

pub struct CommandContext {
    pub config: OcdcConfig,
    pub ports: PortAllocator,
    pub queue: CleanupQueue,
    subprocess: SubprocessManager,
}

impl CommandContext {
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)
            .await
            .context("Failed to load configuration")?;
        debug!(
            state_dir = %config.paths.state_dir.display(),
            clones_root = %config.paths.clones_root.display(),
            "Configuration loaded"
        );
        Ok(Self::from_config(config, SubprocessManager::production()))
    }

    pub fn from_config(config: OcdcConfig, subprocess: SubprocessManager) -> Self {
        Self {
            ports: PortAllocator::new(&config),
            queue: CleanupQueue::new(&config),
            config,
            subprocess,
        }
    }

    pub fn executor(&self) -> CleanupExecutor {
        CleanupExecutor::new(
            self.config.clones_root(),
            self.ports.clone(),
            Arc::new(Tmux::new(self.subprocess.clone())),
            Arc::new(DockerContainers::new(self.subprocess.clone())),
            Arc::new(GitCli::new(self.subprocess.clone())),
        )
    }

    pub fn sweeper(&self) -> CleanupSweeper {
        CleanupSweeper::new(
            self.queue.clone(),
            self.executor(),
            Arc::new(GhCli::new(self.subprocess.clone())),
        )
    }
}
