//! TOML settings loading.

mod paths;


use crate::schema::Settings;
use parley_common::ConfigError;
use std::path::Path;
use tracing::info;

pub use paths::default_config_path;

/// Load settings from a specific TOML file path.
///
/// Missing fields fall back to serde defaults. Validation is left to the caller.
pub fn load_from_path(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let settings: Settings = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings from the platform default path, or defaults if no file exists there.
///
/// On Linux: `~/.config/parley/config.toml`
/// On macOS: `~/Library/Application Support/parley/config.toml`
pub fn load_default() -> Result<Settings, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Ok(settings) => Ok(settings),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no settings at {}, using defaults", path.display());
            Ok(Settings::default())
        }
        Err(e) => Err(e),
    }
}
