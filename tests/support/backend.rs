#![allow(dead_code)]

use irisdesk::Config;
use irisdesk::session::{ChatItem, Console};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Config pointing every endpoint at `server`.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.backend.base_url = server.uri();
    config
}

pub fn console_for(server: &MockServer) -> Console {
    Console::from_config(&config_for(server)).expect("console from config")
}

pub fn draft_outreach_reply() -> Value {
    json!({
        "summary": "Draft ready",
        "proposed_commands": [
            {"command": "create_page", "payload": {"db_key": "outreach", "properties": {"Name": "Q3 email"}}}
        ]
    })
}

/// The newest governance item in the log.
pub fn last_card(console: &Console) -> ChatItem {
    console
        .snapshot()
        .into_iter()
        .rev()
        .find(|item| item.card().is_some())
        .expect("a governance item")
}
