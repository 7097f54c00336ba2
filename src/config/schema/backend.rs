use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend base URL (default: http://127.0.0.1:8000)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Command submission path (default: /commands)
    #[serde(default = "default_command_path")]
    pub command_path: String,
    /// Execution-creation path (default: /executions)
    #[serde(default = "default_execute_path")]
    pub execute_path: String,
    /// Approval path (default: /approvals)
    #[serde(default = "default_approve_path")]
    pub approve_path: String,
    /// Batch preview path (default: /previews)
    #[serde(default = "default_preview_path")]
    pub preview_path: String,
    /// Secondary command path, consulted only when the primary reply carries
    /// no text, no proposals and no execution/approval markers.
    #[serde(default)]
    pub fallback_command_path: Option<String>,
    /// Bearer token sent on every request
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_command_path() -> String {
    "/commands".into()
}

fn default_execute_path() -> String {
    "/executions".into()
}

fn default_approve_path() -> String {
    "/approvals".into()
}

fn default_preview_path() -> String {
    "/previews".into()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            command_path: default_command_path(),
            execute_path: default_execute_path(),
            approve_path: default_approve_path(),
            preview_path: default_preview_path(),
            fallback_command_path: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Resolve an endpoint path against `base_url`.
    ///
    /// Absolute URLs are accepted as-is so a single endpoint can live on a
    /// different host. Relative paths are appended to the base path rather
    /// than replacing it, so `http://host/api` + `/commands` becomes
    /// `http://host/api/commands`.
    pub fn endpoint(&self, path: &str) -> Result<String, ConfigError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ConfigError::Endpoint {
                path: path.to_string(),
                message: "path is empty".into(),
            });
        }
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute.to_string());
        }

        let mut base = Url::parse(self.base_url.trim()).map_err(|e| ConfigError::Endpoint {
            path: self.base_url.clone(),
            message: e.to_string(),
        })?;
        let joined = format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        base.set_path(&joined);
        Ok(base.to_string())
    }

    pub fn command_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.command_path)
    }

    pub fn execute_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.execute_path)
    }

    pub fn approve_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.approve_path)
    }

    pub fn preview_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.preview_path)
    }

    pub fn fallback_url(&self) -> Result<Option<String>, ConfigError> {
        self.fallback_command_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| self.endpoint(p))
            .transpose()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(self.base_url.trim()).map_err(|e| {
            ConfigError::Validation(format!("backend.base_url '{}': {e}", self.base_url))
        })?;
        self.command_url()?;
        self.execute_url()?;
        self.approve_url()?;
        self.preview_url()?;
        self.fallback_url()?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "backend.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_config() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.command_path, "/commands");
        assert!(config.fallback_command_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let config = BackendConfig {
            base_url: "http://host:9000/api/".into(),
            ..BackendConfig::default()
        };
        assert_eq!(
            config.endpoint("/commands").unwrap(),
            "http://host:9000/api/commands"
        );
        assert_eq!(
            config.endpoint("approvals").unwrap(),
            "http://host:9000/api/approvals"
        );
    }

    #[test]
    fn endpoint_accepts_absolute_url() {
        let config = BackendConfig::default();
        assert_eq!(
            config.endpoint("https://other.example/exec").unwrap(),
            "https://other.example/exec"
        );
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let config = BackendConfig {
            execute_path: "  ".into(),
            ..BackendConfig::default()
        };
        assert!(config.execute_url().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_fallback_path_means_no_fallback() {
        let config = BackendConfig {
            fallback_command_path: Some(" ".into()),
            ..BackendConfig::default()
        };
        assert_eq!(config.fallback_url().unwrap(), None);
    }

    #[test]
    fn bad_base_url_fails_validation() {
        let config = BackendConfig {
            base_url: "not a url".into(),
            ..BackendConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backend.base_url"));
    }

    #[test]
    fn backend_config_toml_round_trip() {
        let original = BackendConfig {
            base_url: "https://desk.example".into(),
            fallback_command_path: Some("/v1/commands".into()),
            api_key: Some("token".into()),
            ..BackendConfig::default()
        };

        let toml = toml::to_string(&original).unwrap();
        let decoded: BackendConfig = toml::from_str(&toml).unwrap();

        assert_eq!(decoded.base_url, original.base_url);
        assert_eq!(decoded.fallback_command_path, original.fallback_command_path);
        assert_eq!(decoded.api_key, original.api_key);
        assert_eq!(decoded.timeout_secs, 120);
    }
}
