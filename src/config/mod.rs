//! Runtime configuration
//!
//! One [`OcdcConfig`] is built at startup (defaults, then the YAML file,
//! then environment overrides) and handed to each component constructor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod loader;


pub use loader::{default_config_path, load_config};

use crate::cleanup::CleanupConfig;
use crate::error::{OcdcError, OcdcResult};
use crate::storage::LockPolicy;

pub const PORT_MAP_FILE: &str = "ports.json";
pub const CLEANUP_QUEUE_FILE: &str = "cleanup-queue.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcdcConfig {
    pub ports: PortRange,
    pub paths: PathsConfig,
    pub lock: LockPolicy,
    pub cleanup: CleanupConfig,
}

/// Inclusive range of host ports handed out to workspaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortRange {
    pub range_start: u16,
    pub range_end: u16,
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            range_start: 13000,
            range_end: 13099,
        }
    }
}

impl PortRange {
    pub fn new(range_start: u16, range_end: u16) -> Self {
        Self {
            range_start,
            range_end,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> {
        self.range_start..=self.range_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the port map, the cleanup queue and their locks
    pub state_dir: PathBuf,
    /// Root under which workspace clones live; `remove_clone` never leaves it
    pub clones_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let cache = dirs::home_dir()
            .map(|home| home.join(".cache"))
            .unwrap_or_else(std::env::temp_dir);
        Self {
            state_dir: cache.join("ocdc"),
            clones_root: cache.join("devcontainer-clones"),
        }
    }
}

impl OcdcConfig {
    /// Configuration rooted at `state_dir`, otherwise default
    pub fn with_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.paths.state_dir = state_dir.into();
        config
    }

    pub fn port_map_path(&self) -> PathBuf {
        self.paths.state_dir.join(PORT_MAP_FILE)
    }

    pub fn cleanup_queue_path(&self) -> PathBuf {
        self.paths.state_dir.join(CLEANUP_QUEUE_FILE)
    }

    pub fn clones_root(&self) -> &Path {
        &self.paths.clones_root
    }

    /// Apply `OCDC_*` overrides using `lookup` to read variables
    pub fn merge_env_vars_from<F>(&mut self, lookup: F) -> OcdcResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(start) = lookup("OCDC_PORT_START") {
            self.ports.range_start = parse_port("OCDC_PORT_START", &start)?;
        }

        if let Some(end) = lookup("OCDC_PORT_END") {
            self.ports.range_end = parse_port("OCDC_PORT_END", &end)?;
        }

        if let Some(dir) = lookup("OCDC_CACHE_DIR") {
            self.paths.state_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("OCDC_CLONES_DIR") {
            self.paths.clones_root = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Apply `OCDC_*` overrides from the process environment
    pub fn merge_env_vars(&mut self) -> OcdcResult<()> {
        self.merge_env_vars_from(|key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> OcdcResult<()> {
        if self.ports.range_start == 0 {
            return Err(OcdcError::config("port range must not start at 0"));
        }
        if self.ports.range_start > self.ports.range_end {
            return Err(OcdcError::config(format!(
                "port range start {} is greater than end {}",
                self.ports.range_start, self.ports.range_end
            )));
        }
        if self.lock.retry_interval.is_zero() {
            return Err(OcdcError::config("lock retry_interval must be positive"));
        }
        Ok(())
    }
}

fn parse_port(name: &str, value: &str) -> OcdcResult<u16> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| OcdcError::config(format!("{name} must be a port number, got '{value}'")))
}
