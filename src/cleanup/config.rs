//! Configuration for automatic workspace cleanup

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::action::{CleanupAction, CleanupReason};
use super::delay::parse_delay;

/// Which terminal states trigger cleanup, how long to wait, and what to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Enable automatic cleanup
    pub enabled: bool,

    /// Delay between detection and execution (`30s`, `5m`, `2h`, or minutes)
    pub delay: String,

    /// Reasons that enqueue a cleanup
    pub on: Vec<CleanupReason>,

    /// Actions run, in order, once the item is ready
    pub actions: Vec<CleanupAction>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: "5m".to_string(),
            on: vec![CleanupReason::Merged, CleanupReason::Closed],
            actions: vec![CleanupAction::KillSession, CleanupAction::StopContainer],
        }
    }
}

impl CleanupConfig {
    /// Create a configuration that cleans up as soon as a sweep runs
    pub fn immediate() -> Self {
        Self {
            delay: "0s".to_string(),
            ..Default::default()
        }
    }

    /// Whether a reported reason should enqueue a cleanup
    pub fn is_actionable(&self, reason: Option<CleanupReason>) -> bool {
        match reason {
            Some(reason) => self.enabled && self.on.contains(&reason),
            None => false,
        }
    }

    /// Parsed delay
    pub fn delay_duration(&self) -> Duration {
        parse_delay(&self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CleanupConfig::default();
        assert!(config.enabled);
        assert_eq!(config.delay_duration(), Duration::from_secs(300));
        assert_eq!(config.on, vec![CleanupReason::Merged, CleanupReason::Closed]);
        assert_eq!(
            config.actions,
            vec![CleanupAction::KillSession, CleanupAction::StopContainer]
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults_for_missing_fields() {
        let config: CleanupConfig = serde_yaml::from_str("delay: 1h\non: [merged]\n").unwrap();
        assert!(config.enabled);
        assert_eq!(config.delay_duration(), Duration::from_secs(3600));
        assert_eq!(config.on, vec![CleanupReason::Merged]);
        assert_eq!(config.actions, CleanupConfig::default().actions);
    }

    #[test]
    fn test_reason_outside_on_list_is_not_actionable() {
        let config = CleanupConfig {
            on: vec![CleanupReason::Merged],
            ..Default::default()
        };
        assert!(config.is_actionable(Some(CleanupReason::Merged)));
        assert!(!config.is_actionable(Some(CleanupReason::Closed)));
        assert!(!config.is_actionable(None));
    }

    #[test]
    fn test_disabled_config_is_never_actionable() {
        let config = CleanupConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!config.is_actionable(Some(CleanupReason::Merged)));
    }
}
