// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Application configuration (remote call limits, canvas layout, logging).

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Limits on calls to the session daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Upper bound for any single remote call, in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 3000,
        }
    }
}

/// Canvas layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Offset of the split sub-box when no persisted coordinates exist.
    pub split_offset: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            split_offset: crate::view::DEFAULT_SPLIT_OFFSET,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter; `RUST_LOG` overrides it.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "studiobay=debug".to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load config from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.remote.call_timeout_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Manages configuration file persistence.
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager, initializing directories.
    pub fn new() -> Result<Self, ConfigError> {
        let project_dirs =
            ProjectDirs::from("", "", "studiobay").ok_or(ConfigError::NoConfigDir)?;
        Self::at(project_dirs.config_dir())
    }

    /// Use an explicit config directory instead of the platform default.
    pub fn at(config_dir: &Path) -> Result<Self, ConfigError> {
        fs::create_dir_all(config_dir)?;
        Ok(Self {
            config_dir: config_dir.to_path_buf(),
        })
    }

    /// Get the path to the main config file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Load the application config, falling back to defaults when the file
    /// does not exist yet.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let path = self.config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(AppConfig::from_toml(&content)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Save the application config.
    pub fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = config.to_toml()?;
        fs::write(self.config_path(), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.remote.call_timeout_ms, 3000);
        assert_eq!(config.canvas.split_offset, 50.0);
        assert_eq!(config.log.filter, "studiobay=debug");
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.remote.call_timeout_ms = 1500;
        config.canvas.split_offset = 80.0;

        let toml = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed.remote.call_timeout_ms, 1500);
        assert_eq!(parsed.canvas.split_offset, 80.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = AppConfig::from_toml("[remote]\ncall_timeout_ms = 500\n").unwrap();
        assert_eq!(config.remote.call_timeout_ms, 500);
        assert_eq!(config.canvas.split_offset, 50.0);
    }

    #[test]
    fn test_manager_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::at(dir.path()).unwrap();

        // Missing file loads defaults.
        let config = manager.load_config().unwrap();
        assert_eq!(config.remote.call_timeout_ms, 3000);

        let mut config = AppConfig::default();
        config.log.filter = "studiobay=trace".to_string();
        manager.save_config(&config).unwrap();

        let reloaded = manager.load_config().unwrap();
        assert_eq!(reloaded.log.filter, "studiobay=trace");
    }
}
