//! Alias tables for reply fields. Each concept has one ordered table of
//! JSON paths; the first path that yields a usable value wins.

use crate::governance::GovernanceState;
use serde_json::Value;

pub type AliasPath = &'static [&'static str];

pub const TEXT: &[AliasPath] = &[
    &["system_text"],
    &["systemText"],
    &["message"],
    &["response"],
    &["text"],
    &["content"],
    &["agent_response", "text"],
    &["agent_response", "message"],
    &["agent_response", "content"],
    &["agentResponse", "text"],
    &["agentResponse", "message"],
    &["agent_response"],
    &["agentResponse"],
    &["result", "message"],
    &["result", "response"],
    &["result", "text"],
];

pub const STATE: &[AliasPath] = &[
    &["state"],
    &["governance_state"],
    &["governanceState"],
    &["governance", "state"],
    &["governance", "status"],
    &["approval", "state"],
    &["approval", "status"],
];

pub const EXECUTION_STATE: &[AliasPath] = &[
    &["execution_state"],
    &["executionState"],
    &["execution", "state"],
    &["execution", "status"],
    &["result", "execution_state"],
    &["result", "executionState"],
    &["governance", "execution_state"],
    &["governance", "executionState"],
];

pub const EXECUTION_ID: &[AliasPath] = &[
    &["execution_id"],
    &["executionId"],
    &["execution", "id"],
    &["execution", "execution_id"],
    &["result", "execution_id"],
    &["result", "executionId"],
    &["governance", "execution_id"],
    &["governance", "executionId"],
];

pub const APPROVAL_ID: &[AliasPath] = &[
    &["approval_id"],
    &["approvalId"],
    &["approval", "id"],
    &["approval", "approval_id"],
    &["approval", "approvalId"],
    &["governance", "approval_id"],
    &["governance", "approvalId"],
];

pub const TITLE: &[AliasPath] = &[
    &["title"],
    &["governance", "title"],
    &["approval", "title"],
];

pub const SUMMARY: &[AliasPath] = &[
    &["summary"],
    &["governance", "summary"],
    &["approval", "summary"],
];

pub const REASONS: &[AliasPath] = &[
    &["reasons"],
    &["governance", "reasons"],
    &["approval", "reasons"],
    &["reason"],
    &["governance", "reason"],
    &["approval", "reason"],
];

pub const PROPOSALS: &[AliasPath] = &[
    &["proposed_commands"],
    &["proposedCommands"],
    &["proposals"],
    &["result", "proposed_commands"],
    &["result", "proposedCommands"],
    &["result", "proposals"],
    &["governance", "proposed_commands"],
    &["governance", "proposedCommands"],
    &["governance", "proposals"],
];

/// Follow `path` through nested objects.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// First value in `table` accepted by `pick`.
pub fn resolve<'a, T>(
    value: &'a Value,
    table: &[AliasPath],
    mut pick: impl FnMut(&'a Value) -> Option<T>,
) -> Option<T> {
    table
        .iter()
        .filter_map(|path| lookup(value, path))
        .find_map(|found| pick(found))
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Identifiers may arrive as strings or numbers.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        other => non_empty_str(other),
    }
}

pub fn resolve_text(value: &Value) -> Option<String> {
    resolve(value, TEXT, |v| {
        v.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string)
    })
}

/// First alias carrying a recognised state; unknown spellings are skipped.
pub fn resolve_state(value: &Value) -> Option<GovernanceState> {
    resolve(value, STATE, |v| v.as_str().and_then(GovernanceState::parse))
}

pub fn resolve_execution_state(value: &Value) -> Option<String> {
    resolve(value, EXECUTION_STATE, non_empty_str)
}

pub fn resolve_execution_id(value: &Value) -> Option<String> {
    resolve(value, EXECUTION_ID, identifier)
}

pub fn resolve_approval_id(value: &Value) -> Option<String> {
    resolve(value, APPROVAL_ID, identifier)
}

pub fn resolve_title(value: &Value) -> Option<String> {
    resolve(value, TITLE, non_empty_str)
}

pub fn resolve_summary(value: &Value) -> Option<String> {
    resolve(value, SUMMARY, non_empty_str)
}

/// Reasons may be a list of strings or a single string.
pub fn resolve_reasons(value: &Value) -> Vec<String> {
    resolve(value, REASONS, |v| match v {
        Value::Array(items) => {
            let reasons: Vec<String> = items.iter().filter_map(non_empty_str).collect();
            (!reasons.is_empty()).then_some(reasons)
        }
        other => non_empty_str(other).map(|reason| vec![reason]),
    })
    .unwrap_or_default()
}

/// First proposal container that is an array, even an empty one.
pub fn resolve_proposal_container(value: &Value) -> Option<&Vec<Value>> {
    resolve(value, PROPOSALS, Value::as_array)
}
