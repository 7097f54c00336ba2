use super::state::{ExecutionOutcome, GovernanceState};
use crate::error::GovernanceError;
use crate::registry::ProposedCommand;
use serde::Serialize;

/// Information to merge into a card. Every field is optional; merging only
/// ever adds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub reasons: Vec<String>,
    pub approval_id: Option<String>,
    pub execution_id: Option<String>,
}

/// Client-side view of one execution's approval lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernanceCard {
    state: GovernanceState,
    title: String,
    summary: Option<String>,
    reasons: Vec<String>,
    approval_id: Option<String>,
    execution_id: Option<String>,
    proposals: Vec<ProposedCommand>,
    history: Vec<GovernanceState>,
}

/// Title shown when the backend did not send one.
#[must_use]
pub fn default_title(
    state: GovernanceState,
    proposal_count: usize,
    outcome: Option<&ExecutionOutcome>,
) -> String {
    match state {
        GovernanceState::Blocked if proposal_count > 0 => "Proposals awaiting approval".into(),
        GovernanceState::Blocked => "Approval required".into(),
        GovernanceState::Approved => "Approved".into(),
        GovernanceState::Executed => match outcome {
            Some(ExecutionOutcome::Failed) => "Execution failed".into(),
            _ => "Execution completed".into(),
        },
    }
}

impl GovernanceCard {
    #[must_use]
    pub fn new(state: GovernanceState, title: impl Into<String>) -> Self {
        Self {
            state,
            title: title.into(),
            summary: None,
            reasons: Vec::new(),
            approval_id: None,
            execution_id: None,
            proposals: Vec::new(),
            history: vec![state],
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary.filter(|s| !s.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_reasons(mut self, reasons: Vec<String>) -> Self {
        self.push_reasons(reasons);
        self
    }

    #[must_use]
    pub fn with_approval_id(mut self, approval_id: Option<String>) -> Self {
        self.approval_id = approval_id.filter(|id| !id.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_execution_id(mut self, execution_id: Option<String>) -> Self {
        self.execution_id = execution_id.filter(|id| !id.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_proposals(mut self, proposals: Vec<ProposedCommand>) -> Self {
        self.proposals = proposals;
        self
    }

    pub fn state(&self) -> GovernanceState {
        self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn approval_id(&self) -> Option<&str> {
        self.approval_id.as_deref()
    }

    pub fn execution_id(&self) -> Option<&str> {
        self.execution_id.as_deref()
    }

    pub fn proposals(&self) -> &[ProposedCommand] {
        &self.proposals
    }

    /// Every state this card has been in, oldest first.
    pub fn history(&self) -> &[GovernanceState] {
        &self.history
    }

    /// Attach the approval id. Re-attaching the same id is a no-op; a
    /// different id is refused.
    pub fn attach_approval_id(&mut self, approval_id: &str) -> Result<(), GovernanceError> {
        let approval_id = approval_id.trim();
        if approval_id.is_empty() {
            return Ok(());
        }
        match &self.approval_id {
            Some(existing) if existing == approval_id => Ok(()),
            Some(existing) => Err(GovernanceError::ApprovalIdLocked {
                existing: existing.clone(),
                attempted: approval_id.to_string(),
            }),
            None => {
                self.approval_id = Some(approval_id.to_string());
                Ok(())
            }
        }
    }

    fn push_reasons(&mut self, reasons: Vec<String>) {
        for reason in reasons {
            let reason = reason.trim().to_string();
            if !reason.is_empty() && !self.reasons.contains(&reason) {
                self.reasons.push(reason);
            }
        }
    }

    /// Merge information without changing state: blanks are filled, reasons
    /// appended, nothing already present is replaced.
    pub fn enrich(&mut self, update: CardUpdate) -> Result<(), GovernanceError> {
        if let Some(approval_id) = &update.approval_id {
            self.attach_approval_id(approval_id)?;
        }
        if let Some(execution_id) = update.execution_id.filter(|id| !id.trim().is_empty()) {
            match &self.execution_id {
                None => self.execution_id = Some(execution_id),
                Some(existing) if *existing != execution_id => {
                    tracing::warn!(
                        existing = existing.as_str(),
                        ignored = execution_id.as_str(),
                        "keeping original execution id on governance card"
                    );
                }
                Some(_) => {}
            }
        }
        if self.summary.is_none() {
            self.summary = update.summary.filter(|s| !s.trim().is_empty());
        }
        self.push_reasons(update.reasons);
        Ok(())
    }

    /// Move to `to` and merge `update`. The title follows the new state;
    /// everything else merges as in [`enrich`](Self::enrich).
    pub fn advance(
        &mut self,
        to: GovernanceState,
        update: CardUpdate,
    ) -> Result<(), GovernanceError> {
        if !self.state.can_transition_to(to) {
            tracing::warn!(from = %self.state, to = %to, "rejected governance transition");
            return Err(GovernanceError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        if let (Some(existing), Some(attempted)) = (&self.approval_id, &update.approval_id)
            && existing != attempted.trim()
            && !attempted.trim().is_empty()
        {
            return Err(GovernanceError::ApprovalIdLocked {
                existing: existing.clone(),
                attempted: attempted.clone(),
            });
        }

        let title = update.title.clone().filter(|t| !t.trim().is_empty());
        self.enrich(update)?;
        self.state = to;
        self.history.push(to);
        if let Some(title) = title {
            self.title = title;
        }
        Ok(())
    }
}
