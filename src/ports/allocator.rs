use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::probe::{PortProbe, TcpBindProbe};
use super::{workspace_key, PortAssignment, PortMap, TrackedWorkspace, WorkspaceMeta};
use crate::config::{OcdcConfig, PortRange};
use crate::error::{OcdcError, OcdcResult};
use crate::storage::{LockPolicy, LockedStore};

/// Hands out ports from the configured range, one per workspace
#[derive(Clone)]
pub struct PortAllocator {
    store: LockedStore<PortMap>,
    range: PortRange,
    probe: Arc<dyn PortProbe>,
}

impl PortAllocator {
    /// Allocator for the configured port map, probing with real binds
    pub fn new(config: &OcdcConfig) -> Self {
        Self::with_probe(
            config.port_map_path(),
            config.ports,
            config.lock.clone(),
            Arc::new(TcpBindProbe),
        )
    }

    pub fn with_probe(
        map_path: impl Into<PathBuf>,
        range: PortRange,
        policy: LockPolicy,
        probe: Arc<dyn PortProbe>,
    ) -> Self {
        Self {
            store: LockedStore::new(map_path, policy),
            range,
            probe,
        }
    }

    pub fn range(&self) -> PortRange {
        self.range
    }

    pub fn probe(&self) -> Arc<dyn PortProbe> {
        Arc::clone(&self.probe)
    }

    /// Return the workspace's port, assigning the lowest free one if needed
    ///
    /// The scan and the write both happen under the port map lock, so
    /// concurrent callers for different workspaces never get the same port.
    pub async fn allocate(
        &self,
        workspace: &Path,
        meta: WorkspaceMeta,
    ) -> OcdcResult<PortAssignment> {
        let key = workspace_key(workspace);
        let range = self.range;
        let probe = Arc::clone(&self.probe);

        self.store
            .update(move |map| {
                if let Some(existing) = map.get(&key) {
                    debug!(workspace = %key, port = existing.port, "Workspace already has a port");
                    return Ok(existing.clone());
                }

                let taken: HashSet<u16> = map.values().map(|entry| entry.port).collect();
                let port = range
                    .iter()
                    .filter(|port| !taken.contains(port))
                    .find(|port| !probe.is_in_use(*port))
                    .ok_or(OcdcError::RangeExhausted {
                        start: range.range_start,
                        end: range.range_end,
                    })?;

                let assignment = PortAssignment {
                    port,
                    repo: meta.repo,
                    branch: meta.branch,
                    started: Utc::now(),
                };
                map.insert(key.clone(), assignment.clone());
                info!(workspace = %key, port, "Allocated port");
                Ok(assignment)
            })
            .await
    }

    /// Forget the workspace's port; returns whether an entry was removed
    pub async fn release(&self, workspace: &Path) -> OcdcResult<bool> {
        let key = workspace_key(workspace);
        self.store
            .update(move |map| {
                let removed = map.remove(&key);
                match &removed {
                    Some(entry) => info!(workspace = %key, port = entry.port, "Released port"),
                    None => debug!(workspace = %key, "No port assigned, nothing to release"),
                }
                Ok(removed.is_some())
            })
            .await
    }

    /// Current assignment for a workspace, if tracked
    pub async fn get(&self, workspace: &Path) -> OcdcResult<Option<PortAssignment>> {
        let key = workspace_key(workspace);
        Ok(self.store.load().await?.remove(&key))
    }

    /// All tracked workspaces, ordered by port
    pub async fn list(&self) -> OcdcResult<Vec<TrackedWorkspace>> {
        let map = self.store.load().await?;
        let mut tracked: Vec<TrackedWorkspace> = map
            .into_iter()
            .map(|(path, assignment)| TrackedWorkspace {
                path: PathBuf::from(path),
                assignment,
            })
            .collect();
        tracked.sort_by_key(|entry| entry.assignment.port);
        Ok(tracked)
    }

    /// Raw port map snapshot keyed by workspace path
    pub async fn snapshot(&self) -> OcdcResult<PortMap> {
        self.store.load().await
    }
}
