//! State of the pull request / issue a workspace was created for

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::cleanup::CleanupReason;
use crate::subprocess::{ProcessCommand, SubprocessManager};

/// Outcome of asking the tracker about a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateCheck {
    pub should_cleanup: bool,
    pub reason: Option<CleanupReason>,
}

impl StateCheck {
    pub fn active() -> Self {
        Self::default()
    }

    pub fn finished(reason: CleanupReason) -> Self {
        Self {
            should_cleanup: true,
            reason: Some(reason),
        }
    }
}

#[async_trait]
pub trait WorkItemState: Send + Sync {
    async fn check_state(&self, source_type: &str, source_url: &str) -> Result<StateCheck>;
}

const GH_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub CLI implementation for `github_pr` and `github_issue` sources
pub struct GhCli {
    subprocess: SubprocessManager,
}

#[derive(Debug, Deserialize)]
struct GhState {
    state: String,
}

impl GhCli {
    pub fn new(subprocess: SubprocessManager) -> Self {
        Self { subprocess }
    }

    async fn view_state(&self, kind: &str, url: &str) -> Result<String> {
        let output = self
            .subprocess
            .run(
                ProcessCommand::new("gh")
                    .args([kind, "view", url, "--json", "state"])
                    .timeout(GH_TIMEOUT),
            )
            .await
            .with_context(|| format!("Failed to execute gh {kind} view"))?;

        if !output.status.success() {
            bail!("gh {} view {} failed: {}", kind, url, output.stderr.trim());
        }

        let parsed: GhState = serde_json::from_str(&output.stdout)
            .with_context(|| format!("Unexpected gh output: {}", output.stdout.trim()))?;
        Ok(parsed.state)
    }
}

#[async_trait]
impl WorkItemState for GhCli {
    async fn check_state(&self, source_type: &str, source_url: &str) -> Result<StateCheck> {
        let check = match source_type {
            "github_pr" => match self.view_state("pr", source_url).await?.as_str() {
                "MERGED" => StateCheck::finished(CleanupReason::Merged),
                "CLOSED" => StateCheck::finished(CleanupReason::Closed),
                _ => StateCheck::active(),
            },
            "github_issue" => match self.view_state("issue", source_url).await?.as_str() {
                "CLOSED" => StateCheck::finished(CleanupReason::Closed),
                _ => StateCheck::active(),
            },
            other => {
                debug!("No state check available for source type '{}'", other);
                StateCheck::active()
            }
        };
        Ok(check)
    }
}

/// Fixed answers keyed by source URL
#[derive(Clone, Default)]
pub struct MockWorkItemState {
    states: Arc<Mutex<HashMap<String, StateCheck>>>,
}

impl MockWorkItemState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, source_url: &str, check: StateCheck) {
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source_url.to_string(), check);
    }
}

#[async_trait]
impl WorkItemState for MockWorkItemState {
    async fn check_state(&self, _source_type: &str, source_url: &str) -> Result<StateCheck> {
        Ok(self
            .states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(source_url)
            .copied()
            .unwrap_or_default())
    }
}
