use super::endpoints::Endpoints;
use super::outcome::Outcome;
use crate::error::{ApprovalError, DeskError, TransportError};
use crate::governance::{CardUpdate, GovernanceCard, GovernanceState, default_title};
use crate::normalize::{NormalizeOptions, NormalizedResponse, normalize_body};
use crate::registry::{BatchPreview, PatchSet, ProposedCommand};
use crate::transport::Transport;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reply to a create-execution call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionTicket {
    pub execution_id: Option<String>,
    pub approval_id: Option<String>,
    pub response: NormalizedResponse,
}

impl ExecutionTicket {
    /// The card for this new execution: BLOCKED, carrying the returned
    /// approval id. Moves straight to EXECUTED when the backend already
    /// reports a terminal execution state.
    pub fn card(&self, proposal: &ProposedCommand) -> GovernanceCard {
        let reported = self.response.governance.as_ref();
        let title = reported.map_or_else(
            || default_title(GovernanceState::Blocked, 0, None),
            |card| card.title().to_string(),
        );
        let mut card = GovernanceCard::new(GovernanceState::Blocked, title)
            .with_summary(reported.and_then(|c| c.summary().map(str::to_string)))
            .with_reasons(reported.map(|c| c.reasons().to_vec()).unwrap_or_default())
            .with_approval_id(self.approval_id.clone())
            .with_execution_id(self.execution_id.clone())
            .with_proposals(vec![proposal.clone()]);

        if let Some(outcome) = self.response.execution_outcome()
            && outcome.is_terminal()
        {
            let update = CardUpdate {
                title: Some(default_title(
                    GovernanceState::Executed,
                    0,
                    Some(&outcome),
                )),
                ..CardUpdate::default()
            };
            if let Err(e) = card.advance(GovernanceState::Executed, update) {
                tracing::warn!("could not mark new execution as executed: {e}");
            }
        }
        card
    }
}

/// Reply to an approval call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalReceipt {
    pub approval_id: String,
    pub response: NormalizedResponse,
}

/// Sequences create-execution and approve calls. Holds no approval id
/// between calls; every approval names its id explicitly.
pub struct ApprovalOrchestrator {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    options: NormalizeOptions,
}

impl ApprovalOrchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoints: Endpoints,
        options: NormalizeOptions,
    ) -> Self {
        Self {
            transport,
            endpoints,
            options,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn exchange(
        &self,
        url: &str,
        payload: &Value,
        cancel: &CancellationToken,
    ) -> Result<Outcome<String>, DeskError> {
        let response = match self.transport.send(url, payload, cancel).await {
            Ok(response) => response,
            Err(TransportError::Cancelled) => return Ok(Outcome::Cancelled),
            Err(e) => return Err(e.into()),
        };
        match response.text(cancel).await {
            Ok(body) => Ok(Outcome::Done(body)),
            Err(TransportError::Cancelled) => Ok(Outcome::Cancelled),
            Err(e) => Err(e.into()),
        }
    }

    /// Submit one proposal, unmodified, to the execution-creation endpoint.
    pub async fn create_execution(
        &self,
        proposal: &ProposedCommand,
        cancel: &CancellationToken,
    ) -> Result<Outcome<ExecutionTicket>, DeskError> {
        let payload = proposal.to_payload();
        let body = match self
            .exchange(&self.endpoints.execute, &payload, cancel)
            .await?
        {
            Outcome::Done(body) => body,
            Outcome::Cancelled => {
                tracing::debug!("create execution cancelled");
                return Ok(Outcome::Cancelled);
            }
        };

        let response = normalize_body(&body, self.options);
        if response.execution_id.is_none() && response.approval_id.is_none() {
            return Err(ApprovalError::EmptyExecution.into());
        }
        tracing::info!(
            execution_id = response.execution_id.as_deref().unwrap_or("-"),
            approval_id = response.approval_id.as_deref().unwrap_or("-"),
            "execution created"
        );
        Ok(Outcome::Done(ExecutionTicket {
            execution_id: response.execution_id.clone(),
            approval_id: response.approval_id.clone(),
            response,
        }))
    }

    /// Approve `approval_id`. A blank id is refused before any request is
    /// made. Patches travel beside the id, never merged into a proposal.
    pub async fn approve(
        &self,
        approval_id: &str,
        patches: &PatchSet,
        cancel: &CancellationToken,
    ) -> Result<Outcome<ApprovalReceipt>, DeskError> {
        let approval_id = approval_id.trim();
        if approval_id.is_empty() {
            tracing::warn!("approval refused: no approval id supplied");
            return Err(ApprovalError::MissingApprovalId.into());
        }

        let mut payload = Map::new();
        payload.insert("approval_id".into(), Value::String(approval_id.to_string()));
        if !patches.is_empty() {
            payload.insert("patches".into(), patches.to_value());
        }

        let body = match self
            .exchange(&self.endpoints.approve, &Value::Object(payload), cancel)
            .await?
        {
            Outcome::Done(body) => body,
            Outcome::Cancelled => {
                tracing::debug!(approval_id, "approval cancelled");
                return Ok(Outcome::Cancelled);
            }
        };

        let response = normalize_body(&body, self.options);
        tracing::info!(
            approval_id,
            execution_state = response.execution_state.as_deref().unwrap_or("-"),
            "approval accepted"
        );
        Ok(Outcome::Done(ApprovalReceipt {
            approval_id: approval_id.to_string(),
            response,
        }))
    }

    /// Fetch a server preview for `proposal` with the operator's pending
    /// edits applied server-side.
    pub async fn preview(
        &self,
        proposal: &ProposedCommand,
        patches: &PatchSet,
        cancel: &CancellationToken,
    ) -> Result<Outcome<BatchPreview>, DeskError> {
        let mut payload = Map::new();
        payload.insert("proposal".into(), proposal.to_payload());
        if !patches.is_empty() {
            payload.insert("patches".into(), patches.to_value());
        }

        let body = match self
            .exchange(&self.endpoints.preview, &Value::Object(payload), cancel)
            .await?
        {
            Outcome::Done(body) => body,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let preview = serde_json::from_str::<Value>(&body)
            .and_then(|reply| BatchPreview::from_value(&reply))
            .map_err(|e| {
                tracing::warn!("rejecting unreadable preview reply: {e}");
                ApprovalError::MalformedPreview(e.to_string())
            })?;
        tracing::debug!(
            operations = preview.operations.len(),
            errors = preview.error_count(),
            "preview fetched"
        );
        Ok(Outcome::Done(preview))
    }
}
