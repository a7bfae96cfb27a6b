// Plugin configuration loaded from YAML

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::errors::PluginError;

/// Environment variable naming a config file when none is given on the CLI
pub const CONFIG_ENV_VAR: &str = "VAGRANT_INVENTORY_CONFIG";

/// Config error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

/// Settings for locating and running vagrant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginConfig {
    /// Path to the vagrant executable, resolved via PATH when bare
    pub binary: PathBuf,
    /// Directory containing the Vagrantfile
    pub project_dir: Option<PathBuf>,
    /// Per-subcommand timeout; unset waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            binary: PathBuf::from("vagrant"),
            project_dir: None,
            timeout_secs: None,
        }
    }
}

impl PluginConfig {
    /// Parse configuration from a YAML string
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(PluginConfig::default());
        }

        let config: PluginConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, PluginError> {
        std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|content| Self::parse_str(&content))
            .map_err(|e| PluginError::Config {
                message: e.to_string(),
                path: Some(path.to_path_buf()),
            })
    }

    /// Load from an explicit path, then the environment, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, PluginError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(env_path) if !env_path.is_empty() => Self::from_file(Path::new(&env_path)),
            _ => Ok(PluginConfig::default()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.binary.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "binary".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
