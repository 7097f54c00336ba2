use crate::config::BackendConfig;
use crate::error::ConfigError;

/// Fully resolved backend URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub command: String,
    pub execute: String,
    pub approve: String,
    pub preview: String,
    pub fallback: Option<String>,
}

impl Endpoints {
    pub fn from_config(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            command: config.command_url()?,
            execute: config.execute_url()?,
            approve: config.approve_url()?,
            preview: config.preview_url()?,
            fallback: config.fallback_url()?,
        })
    }

    /// Endpoints under one base URL with the default paths.
    pub fn under(base_url: &str) -> Result<Self, ConfigError> {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        };
        Self::from_config(&config)
    }
}
