//! Terminal session management (tmux)

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::subprocess::{ProcessCommand, SubprocessManager};

#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn session_exists(&self, name: &str) -> Result<bool>;
    async fn kill_session(&self, name: &str) -> Result<()>;
}

pub struct Tmux {
    subprocess: SubprocessManager,
}

impl Tmux {
    pub fn new(subprocess: SubprocessManager) -> Self {
        Self { subprocess }
    }
}

#[async_trait]
impl SessionManager for Tmux {
    async fn session_exists(&self, name: &str) -> Result<bool> {
        let output = self
            .subprocess
            .run(
                ProcessCommand::new("tmux")
                    .args(["has-session", "-t", name]),
            )
            .await
            .context("Failed to execute tmux has-session")?;
        Ok(output.status.success())
    }

    async fn kill_session(&self, name: &str) -> Result<()> {
        let output = self
            .subprocess
            .run(
                ProcessCommand::new("tmux")
                    .args(["kill-session", "-t", name]),
            )
            .await
            .context("Failed to execute tmux kill-session")?;

        if !output.status.success() {
            bail!("tmux kill-session -t {} failed: {}", name, output.stderr.trim());
        }
        Ok(())
    }
}

/// In-memory session table
#[derive(Clone, Default)]
pub struct MockSessions {
    live: Arc<Mutex<HashSet<String>>>,
}

impl MockSessions {
    pub fn with_sessions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            live: Arc::new(Mutex::new(names.into_iter().map(Into::into).collect())),
        }
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name)
    }
}

#[async_trait]
impl SessionManager for MockSessions {
    async fn session_exists(&self, name: &str) -> Result<bool> {
        Ok(self.is_live(name))
    }

    async fn kill_session(&self, name: &str) -> Result<()> {
        if !self
            .live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
        {
            bail!("can't find session: {name}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_has_session_exit_code_maps_to_existence() {
        let (subprocess, mock) = SubprocessManager::mock();
        mock.on("tmux")
            .with_args(|args| args == ["has-session", "-t", "api-pr-12"])
            .register();
        mock.on("tmux")
            .with_args(|args| args.first().map(String::as_str) == Some("has-session"))
            .exit_code(1)
            .register();

        let tmux = Tmux::new(subprocess);
        assert!(tmux.session_exists("api-pr-12").await.unwrap());
        assert!(!tmux.session_exists("gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_kill_session_failure_is_reported() {
        let (subprocess, mock) = SubprocessManager::mock();
        mock.on("tmux")
            .exit_code(1)
            .stderr("no server running")
            .register();

        let tmux = Tmux::new(subprocess);
        let err = tmux.kill_session("api-pr-12").await.unwrap_err();
        assert!(err.to_string().contains("no server running"));
    }
}
