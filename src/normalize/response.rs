use super::aliases::{
    resolve_approval_id, resolve_execution_id, resolve_execution_state, resolve_reasons,
    resolve_state, resolve_summary, resolve_text, resolve_title,
};
use super::display::{filter_internal_lines, synthetic_summary};
use super::proposals::extract_proposals;
use crate::config::ConsoleConfig;
use crate::governance::{ExecutionOutcome, GovernanceCard, GovernanceState, default_title};
use crate::registry::ProposedCommand;
use crate::stream::CollectedStream;
use serde_json::Value;

/// Canonical form of one backend reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedResponse {
    pub display_text: Option<String>,
    pub governance: Option<GovernanceCard>,
    pub proposals: Vec<ProposedCommand>,
    pub approval_id: Option<String>,
    pub execution_id: Option<String>,
    pub execution_state: Option<String>,
}

impl NormalizedResponse {
    pub fn execution_outcome(&self) -> Option<ExecutionOutcome> {
        self.execution_state.as_deref().map(ExecutionOutcome::classify)
    }

    /// Whether the reply carried anything at all: text, proposals, a
    /// governance state, or an execution/approval marker.
    pub fn has_signal(&self) -> bool {
        self.display_text.is_some()
            || self.governance.is_some()
            || !self.proposals.is_empty()
            || self.approval_id.is_some()
            || self.execution_id.is_some()
            || self.execution_state.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub filter_internal_lines: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            filter_internal_lines: true,
        }
    }
}

impl From<&ConsoleConfig> for NormalizeOptions {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            filter_internal_lines: config.filter_internal_lines,
        }
    }
}

fn clean_text(text: &str, options: NormalizeOptions) -> Option<String> {
    let text = if options.filter_internal_lines {
        filter_internal_lines(text)
    } else {
        text.to_string()
    };
    (!text.trim().is_empty()).then_some(text)
}

/// Normalize a parsed reply.
pub fn normalize(reply: &Value, options: NormalizeOptions) -> NormalizedResponse {
    let map = match reply {
        Value::Object(map) => map,
        Value::String(text) => return normalize_text(text, options),
        Value::Null => return NormalizedResponse::default(),
        other => return normalize_text(&other.to_string(), options),
    };
    tracing::debug!(fields = map.len(), "normalizing reply");

    let proposals = extract_proposals(reply);
    let execution_state = resolve_execution_state(reply);
    let execution_id = resolve_execution_id(reply);
    let approval_id = resolve_approval_id(reply);
    let outcome = execution_state.as_deref().map(ExecutionOutcome::classify);

    let looks_like_execution = execution_state.is_some()
        || execution_id.is_some()
        || reply.get("approval").is_some_and(Value::is_object);
    let display_text = resolve_text(reply)
        .and_then(|text| clean_text(&text, options))
        .or_else(|| {
            looks_like_execution
                .then(|| {
                    synthetic_summary(
                        reply,
                        execution_state.as_deref(),
                        execution_id.as_deref(),
                        approval_id.as_deref(),
                    )
                })
                .flatten()
        });

    let state = resolve_state(reply).or_else(|| {
        if !proposals.is_empty() {
            Some(GovernanceState::Blocked)
        } else if outcome.as_ref().is_some_and(ExecutionOutcome::is_terminal) {
            Some(GovernanceState::Executed)
        } else {
            None
        }
    });

    let governance = state.map(|state| {
        let title = resolve_title(reply)
            .unwrap_or_else(|| default_title(state, proposals.len(), outcome.as_ref()));
        GovernanceCard::new(state, title)
            .with_summary(resolve_summary(reply))
            .with_reasons(resolve_reasons(reply))
            .with_approval_id(approval_id.clone())
            .with_execution_id(execution_id.clone())
            .with_proposals(proposals.clone())
    });

    NormalizedResponse {
        display_text,
        governance,
        proposals,
        approval_id,
        execution_id,
        execution_state,
    }
}

/// Plain text reply: the whole text is the display text.
pub fn normalize_text(text: &str, options: NormalizeOptions) -> NormalizedResponse {
    NormalizedResponse {
        display_text: clean_text(text, options),
        ..NormalizedResponse::default()
    }
}

/// Normalize an unparsed body. Text that is not JSON becomes the display
/// text as-is.
pub fn normalize_body(body: &str, options: NormalizeOptions) -> NormalizedResponse {
    match serde_json::from_str::<Value>(body) {
        Ok(reply) => normalize(&reply, options),
        Err(e) => {
            tracing::debug!("reply body is not JSON, showing raw text: {e}");
            normalize_text(body, options)
        }
    }
}

/// Normalize a drained stream. Streamed text wins for display; a trailing
/// envelope contributes governance, proposals and ids.
pub fn normalize_stream(collected: &CollectedStream, options: NormalizeOptions) -> NormalizedResponse {
    let streamed = clean_text(&collected.text, options);
    match &collected.envelope {
        Some(envelope) => {
            let mut response = normalize(envelope, options);
            if streamed.is_some() {
                response.display_text = streamed;
            }
            response
        }
        None => NormalizedResponse {
            display_text: streamed,
            ..NormalizedResponse::default()
        },
    }
}
