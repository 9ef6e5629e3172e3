//! Host port assignments for workspaces
//!
//! The port map (`ports.json`) is keyed by the workspace's canonical absolute
//! path and is the only record of which workspaces are tracked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod allocator;
pub mod probe;


pub use allocator::PortAllocator;
pub use probe::{MockPortProbe, PortProbe, TcpBindProbe};

/// One tracked workspace's forwarded port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAssignment {
    pub port: u16,
    pub repo: String,
    pub branch: String,
    pub started: DateTime<Utc>,
}

/// Persisted `ports.json` document
pub type PortMap = BTreeMap<String, PortAssignment>;

/// Caller-supplied description of the workspace being allocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMeta {
    pub repo: String,
    pub branch: String,
}

impl WorkspaceMeta {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
        }
    }
}

/// A port map entry together with its workspace path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedWorkspace {
    pub path: PathBuf,
    #[serde(flatten)]
    pub assignment: PortAssignment,
}

/// Absolute form of a workspace path
///
/// Existing paths have symlinks resolved; paths that no longer exist are
/// made absolute against the current directory so they still match the key
/// recorded when they were allocated.
pub fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Port map key for a workspace path
pub fn workspace_key(path: &Path) -> String {
    canonical_path(path).to_string_lossy().into_owned()
}
