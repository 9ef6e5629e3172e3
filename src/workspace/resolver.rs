//! Bare identifier to workspace path resolution
//!
//! Users usually type a branch name (`ocdc resolve main`) rather than the
//! full clone path. Several tracked workspaces can share a branch name, in
//! which case a running one is preferred, then the most recently started.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::OcdcResult;
use crate::ports::{workspace_key, PortAllocator, PortMap, PortProbe, TrackedWorkspace};

/// Outcome of resolving an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(TrackedWorkspace),
    NotFound,
    /// Candidates that cannot be ordered: none running, identical start times
    Ambiguous(Vec<PathBuf>),
}

// ============================================================================
// Pure candidate selection
// ============================================================================

/// Entries whose branch matches, in path order
pub(crate) fn filter_candidates(
    map: PortMap,
    identifier: &str,
    repo_hint: Option<&str>,
) -> Vec<TrackedWorkspace> {
    map.into_iter()
        .filter(|(_, entry)| entry.branch == identifier)
        .filter(|(_, entry)| repo_hint.map_or(true, |repo| entry.repo == repo))
        .map(|(path, assignment)| TrackedWorkspace {
            path: PathBuf::from(path),
            assignment,
        })
        .collect()
}

/// Latest `started` wins; a tie for latest cannot be decided
pub(crate) fn pick_latest(candidates: Vec<TrackedWorkspace>) -> Resolution {
    let Some(latest) = candidates.iter().map(|c| c.assignment.started).max() else {
        return Resolution::NotFound;
    };

    let mut newest: Vec<TrackedWorkspace> = candidates
        .iter()
        .filter(|c| c.assignment.started == latest)
        .cloned()
        .collect();

    if newest.len() == 1 {
        if let Some(chosen) = newest.pop() {
            return Resolution::Found(chosen);
        }
    }

    Resolution::Ambiguous(candidates.into_iter().map(|c| c.path).collect())
}

// ============================================================================
// Resolver
// ============================================================================

pub struct WorkspaceResolver<'a> {
    ports: &'a PortAllocator,
}

impl<'a> WorkspaceResolver<'a> {
    pub fn new(ports: &'a PortAllocator) -> Self {
        Self { ports }
    }

    pub async fn resolve(
        &self,
        identifier: &str,
        repo_hint: Option<&str>,
    ) -> OcdcResult<Resolution> {
        let mut map = self.ports.snapshot().await?;

        let as_path = Path::new(identifier);
        if as_path.is_absolute() && as_path.exists() {
            let key = workspace_key(as_path);
            if let Some(assignment) = map.remove(&key) {
                debug!(workspace = %key, "Identifier is a tracked workspace path");
                return Ok(Resolution::Found(TrackedWorkspace {
                    path: PathBuf::from(key),
                    assignment,
                }));
            }
        }

        let mut candidates = filter_candidates(map, identifier, repo_hint);
        match candidates.len() {
            0 => return Ok(Resolution::NotFound),
            1 => return Ok(candidates.pop().map_or(Resolution::NotFound, Resolution::Found)),
            _ => {}
        }

        let probe = self.ports.probe();
        if let Some(live) = first_live(&candidates, probe.as_ref()) {
            warn!(
                "Multiple workspaces match '{}'; using {}/{} at {} (running on port {})",
                identifier,
                live.assignment.repo,
                live.assignment.branch,
                live.path.display(),
                live.assignment.port
            );
            return Ok(Resolution::Found(live));
        }

        let resolution = pick_latest(candidates);
        match &resolution {
            Resolution::Found(chosen) => warn!(
                "Multiple workspaces match '{}'; none running, using most recent {}/{} at {}",
                identifier,
                chosen.assignment.repo,
                chosen.assignment.branch,
                chosen.path.display()
            ),
            Resolution::Ambiguous(paths) => warn!(
                "{} workspaces match '{}' and none can be preferred",
                paths.len(),
                identifier
            ),
            Resolution::NotFound => {}
        }
        Ok(resolution)
    }
}

fn first_live(candidates: &[TrackedWorkspace], probe: &dyn PortProbe) -> Option<TrackedWorkspace> {
    candidates
        .iter()
        .find(|c| probe.is_in_use(c.assignment.port))
        .cloned()
}
