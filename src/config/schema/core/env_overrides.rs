use super::types::Config;

impl Config {
    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("IRISDESK_BASE_URL")
            && !base_url.is_empty()
        {
            self.backend.base_url = base_url;
        }

        if let Ok(key) = std::env::var("IRISDESK_API_KEY")
            && !key.is_empty()
        {
            self.backend.api_key = Some(key);
        }

        if let Ok(path) = std::env::var("IRISDESK_FALLBACK_PATH")
            && !path.is_empty()
        {
            self.backend.fallback_command_path = Some(path);
        }

        if let Ok(level) = std::env::var("IRISDESK_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }

        if let Ok(timeout) = std::env::var("IRISDESK_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse::<u64>()
            && secs > 0
        {
            self.backend.timeout_secs = secs;
        }
    }
}
