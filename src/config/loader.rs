use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::OcdcConfig;
use crate::error::{OcdcError, OcdcResult};

/// `~/.config/ocdc/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("ocdc").join("config.yaml"))
}

/// Build the runtime configuration
///
/// An explicitly requested file must exist. Without one, the default path is
/// used when present. Environment overrides are applied last.
pub async fn load_config(explicit: Option<&Path>) -> OcdcResult<OcdcConfig> {
    let mut config = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(OcdcError::ConfigNotFound(path.to_path_buf()));
            }
            load_file(path).await?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => load_file(&path).await?,
            _ => {
                debug!("No configuration file found, using defaults");
                OcdcConfig::default()
            }
        },
    };

    config.merge_env_vars()?;
    config.validate()?;
    Ok(config)
}

/// Parse a YAML configuration file; missing sections keep their defaults
pub async fn load_file(path: &Path) -> OcdcResult<OcdcConfig> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| OcdcError::io(path, e))?;

    if content.trim().is_empty() {
        return Ok(OcdcConfig::default());
    }

    let config: OcdcConfig = serde_yaml::from_str(&content).map_err(|e| {
        OcdcError::config(format!("invalid YAML in {}: {}", path.display(), e))
    })?;

    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
