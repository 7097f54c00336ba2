use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Drop agent/tool/executor/SDK detail lines from displayed text (default: true)
    #[serde(default = "default_true")]
    pub filter_internal_lines: bool,
    /// Primary field carrying the operator text in command submissions (default: "text")
    #[serde(default = "default_request_text_field")]
    pub request_text_field: String,
    /// Also send `input_text`, `message` and `prompt` copies of the operator text (default: true)
    #[serde(default = "default_true")]
    pub send_aliases: bool,
}

fn default_true() -> bool {
    true
}

fn default_request_text_field() -> String {
    "text".into()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            filter_internal_lines: true,
            request_text_field: default_request_text_field(),
            send_aliases: true,
        }
    }
}
