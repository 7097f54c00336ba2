use super::super::{BackendConfig, ConsoleConfig, ObservabilityConfig};
use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".irisdesk").join("config.toml"),
            backend: BackendConfig::default(),
            console: ConsoleConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend.validate()?;
        if self.console.request_text_field.trim().is_empty() {
            return Err(ConfigError::Validation(
                "console.request_text_field must not be empty".into(),
            ));
        }
        Ok(())
    }
}
