use serde::{Deserialize, Serialize};
use tracing::Level;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl ObservabilityConfig {
    /// `None` when `log_level` names no known level.
    pub fn parsed_level(&self) -> Option<Level> {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Level::ERROR),
            "warn" | "warning" => Some(Level::WARN),
            "info" => Some(Level::INFO),
            "debug" => Some(Level::DEBUG),
            "trace" => Some(Level::TRACE),
            _ => None,
        }
    }

    /// Unknown values fall back to `INFO`. Nothing is logged here since the
    /// subscriber is built from this value.
    pub fn level(&self) -> Level {
        self.parsed_level().unwrap_or(Level::INFO)
    }
}
