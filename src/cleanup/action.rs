use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single teardown step applied to a finished workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    /// Terminate the workspace's tmux session
    KillSession,
    /// Stop the devcontainer and free its port
    StopContainer,
    /// Delete the clone directory (guarded by safety gates)
    RemoveClone,
}

impl CleanupAction {
    pub const ALL: [CleanupAction; 3] = [
        CleanupAction::KillSession,
        CleanupAction::StopContainer,
        CleanupAction::RemoveClone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupAction::KillSession => "kill_session",
            CleanupAction::StopContainer => "stop_container",
            CleanupAction::RemoveClone => "remove_clone",
        }
    }
}

impl fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanupAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown cleanup action '{s}' (expected one of: kill_session, stop_container, remove_clone)"
                )
            })
    }
}

/// Terminal state of a work item that can trigger cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupReason {
    Merged,
    Closed,
}

impl CleanupReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupReason::Merged => "merged",
            CleanupReason::Closed => "closed",
        }
    }
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanupReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "merged" => Ok(CleanupReason::Merged),
            "closed" => Ok(CleanupReason::Closed),
            other => Err(format!("unknown cleanup reason '{other}'")),
        }
    }
}
