//! Governance lifecycle states.
//!
//! Transitions only move forward:
//! - Blocked → Approved (explicit approval call succeeded)
//! - Blocked → Executed (backend reported a terminal execution state)
//! - Approved → Executed (approved execution finished)

use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernanceState {
    Blocked,
    Approved,
    Executed,
}

impl GovernanceState {
    /// Case-insensitive parse of a backend-reported state. Unknown values
    /// yield `None` so callers can fall through to the next signal.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "blocked" => Some(Self::Blocked),
            "approved" => Some(Self::Approved),
            "executed" => Some(Self::Executed),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Executed)
    }

    #[must_use]
    pub fn can_transition_to(self, to: GovernanceState) -> bool {
        matches!(
            (self, to),
            (Self::Blocked, Self::Approved)
                | (Self::Blocked, Self::Executed)
                | (Self::Approved, Self::Executed)
        )
    }
}

/// What a backend `execution_state` value says about the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed,
    Failed,
    /// Any non-terminal or unrecognised value, kept as received.
    Pending(String),
}

impl ExecutionOutcome {
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "succeeded" | "success" => Self::Completed,
            "failed" | "failure" | "error" | "errored" => Self::Failed,
            _ => Self::Pending(raw.trim().to_string()),
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(GovernanceState::parse("BLOCKED"), Some(GovernanceState::Blocked));
        assert_eq!(GovernanceState::parse(" approved "), Some(GovernanceState::Approved));
        assert_eq!(GovernanceState::parse("Executed"), Some(GovernanceState::Executed));
        assert_eq!(GovernanceState::parse("COMPLETED"), None);
    }

    #[test]
    fn transitions_only_move_forward() {
        use GovernanceState::{Approved, Blocked, Executed};
        let all = [Blocked, Approved, Executed];
        for from in all {
            for to in all {
                assert_eq!(from.can_transition_to(to), from < to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn only_executed_is_terminal() {
        assert!(GovernanceState::Executed.is_terminal());
        assert!(!GovernanceState::Approved.is_terminal());
        assert!(!GovernanceState::Blocked.is_terminal());
    }

    #[test]
    fn serde_and_display_use_upper_case() {
        assert_eq!(GovernanceState::Blocked.to_string(), "BLOCKED");
        assert_eq!(
            serde_json::to_string(&GovernanceState::Executed).unwrap(),
            "\"EXECUTED\""
        );
    }

    #[test]
    fn execution_outcomes() {
        assert_eq!(ExecutionOutcome::classify("COMPLETED"), ExecutionOutcome::Completed);
        assert_eq!(ExecutionOutcome::classify("errored"), ExecutionOutcome::Failed);
        assert_eq!(ExecutionOutcome::classify("failed"), ExecutionOutcome::Failed);
        assert_eq!(
            ExecutionOutcome::classify("RUNNING"),
            ExecutionOutcome::Pending("RUNNING".into())
        );
        assert!(!ExecutionOutcome::classify("queued").is_terminal());
    }
}
