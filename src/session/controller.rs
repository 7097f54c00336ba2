use super::chat::{ChatItem, MessageRole, MessageStatus};
use super::state::{Busy, SessionState};
use crate::config::{Config, ConsoleConfig};
use crate::error::{ApprovalError, DeskError, GovernanceError, SessionError, TransportError};
use crate::governance::{CardUpdate, GovernanceState, default_title};
use crate::normalize::{
    NormalizeOptions, NormalizedResponse, normalize_body, normalize_stream,
};
use crate::orchestrator::{ApprovalOrchestrator, Endpoints, Outcome};
use crate::registry::{PatchSet, PreviewSession, ProposalSet, ProposedCommand};
use crate::stream::{Classified, CollectedStream, StreamFrame, classify_response};
use crate::transport::{HttpTransport, Transport};
use futures_util::StreamExt;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

const TEXT_ALIASES: [&str; 4] = ["text", "input_text", "message", "prompt"];

/// What one submission produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport {
    pub operator_item: String,
    pub reply_item: Option<String>,
    pub governance_item: Option<String>,
    pub response: NormalizedResponse,
    pub used_fallback: bool,
}

/// Clears a busy flag when the owning action ends, however it ends.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
    busy: Busy,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_busy(self.busy, false);
    }
}

/// Session controller: owns the chat log and drives submissions, execution
/// creation, previews and approvals for one operator session.
pub struct Console {
    transport: Arc<dyn Transport>,
    orchestrator: ApprovalOrchestrator,
    console: ConsoleConfig,
    options: NormalizeOptions,
    state: Mutex<SessionState>,
}

impl Console {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints, console: ConsoleConfig) -> Self {
        let options = NormalizeOptions::from(&console);
        Self {
            orchestrator: ApprovalOrchestrator::new(Arc::clone(&transport), endpoints, options),
            transport,
            console,
            options,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, DeskError> {
        let endpoints = Endpoints::from_config(&config.backend)?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.backend));
        Ok(Self::new(transport, endpoints, config.console.clone()))
    }

    pub fn orchestrator(&self) -> &ApprovalOrchestrator {
        &self.orchestrator
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, busy: Busy) -> Result<BusyGuard<'_>, SessionError> {
        let mut state = self.lock();
        if state.is_busy(busy) {
            return Err(match busy {
                Busy::Submission => SessionError::SubmissionBusy,
                Busy::Approval => SessionError::ApprovalBusy,
            });
        }
        state.set_busy(busy, true);
        Ok(BusyGuard {
            state: &self.state,
            busy,
        })
    }

    /// Record a failed action in the error slot. Cancellation is not
    /// recorded.
    fn record<T>(&self, result: Result<Outcome<T>, DeskError>) -> Result<Outcome<T>, DeskError> {
        match result {
            Err(e) if e.is_cancelled() => Ok(Outcome::Cancelled),
            Err(e) => {
                self.lock().error = Some(e.to_string());
                Err(e)
            }
            ok => ok,
        }
    }

    // ── Read side ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Vec<ChatItem> {
        self.lock().log.items().to_vec()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn draft(&self) -> Option<String> {
        self.lock().draft.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }

    pub fn is_approving(&self) -> bool {
        self.lock().approving
    }

    pub fn preview(&self) -> Option<PreviewSession> {
        self.lock().preview.as_ref().map(|(_, session)| session.clone())
    }

    /// Clear the error slot and hand back the retained draft.
    pub fn retry(&self) -> Option<String> {
        let mut state = self.lock();
        state.error = None;
        state.draft.clone()
    }

    // ── Submission ───────────────────────────────────────────────────────

    fn command_payload(&self, text: &str) -> Value {
        let mut payload = Map::new();
        payload.insert(
            self.console.request_text_field.clone(),
            Value::String(text.to_string()),
        );
        if self.console.send_aliases {
            for alias in TEXT_ALIASES {
                payload
                    .entry(alias)
                    .or_insert_with(|| Value::String(text.to_string()));
            }
        }
        Value::Object(payload)
    }

    /// Submit operator text. Streamed deltas land in a system message as they
    /// arrive; the final reply is normalized and any governance card is
    /// appended after it.
    pub async fn submit(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome<SubmitReport>, DeskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyCommand.into());
        }
        let _busy = self.acquire(Busy::Submission)?;

        let operator_item = {
            let mut state = self.lock();
            state.draft = Some(text.to_string());
            state.error = None;
            state
                .log
                .push_message(MessageRole::Operator, text, MessageStatus::Sending)
        };
        tracing::debug!(item = operator_item.as_str(), "submitting command");

        let mut reply_item = None;
        let result = self
            .run_submission(text, &operator_item, &mut reply_item, cancel)
            .await;

        let mut state = self.lock();
        match &result {
            Ok(Outcome::Done(_)) => state.draft = None,
            Ok(Outcome::Cancelled) => {
                tracing::debug!("submission cancelled");
                let _ = state.log.set_status(&operator_item, MessageStatus::Final);
                if let Some(id) = &reply_item {
                    let _ = state.log.set_status(id, MessageStatus::Final);
                }
            }
            Err(e) if e.is_cancelled() => {
                let _ = state.log.set_status(&operator_item, MessageStatus::Final);
                if let Some(id) = &reply_item {
                    let _ = state.log.set_status(id, MessageStatus::Final);
                }
            }
            Err(e) => {
                tracing::warn!("submission failed: {e}");
                state.error = Some(e.to_string());
                let _ = state.log.set_status(&operator_item, MessageStatus::Error);
                if let Some(id) = &reply_item {
                    let _ = state.log.set_status(id, MessageStatus::Error);
                }
            }
        }
        drop(state);

        match result {
            Err(e) if e.is_cancelled() => Ok(Outcome::Cancelled),
            other => other,
        }
    }

    async fn run_submission(
        &self,
        text: &str,
        operator_item: &str,
        reply_item: &mut Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Outcome<SubmitReport>, DeskError> {
        let payload = self.command_payload(text);
        let primary = self.orchestrator.endpoints().command.clone();

        let mut response = match self.exchange(&primary, &payload, reply_item, cancel).await? {
            Outcome::Done(response) => response,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let mut used_fallback = false;
        if !response.has_signal()
            && let Some(fallback) = self.orchestrator.endpoints().fallback.clone()
        {
            tracing::info!(
                primary = primary.as_str(),
                fallback = fallback.as_str(),
                "primary reply carried no signal, retrying against fallback endpoint"
            );
            response = match self.exchange(&fallback, &payload, reply_item, cancel).await? {
                Outcome::Done(response) => response,
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            };
            used_fallback = true;
        }

        let mut state = self.lock();
        state
            .log
            .set_status(operator_item, MessageStatus::Final)?;

        let display = response.display_text.clone();
        match (reply_item.as_deref(), display) {
            (Some(id), display) => {
                state
                    .log
                    .finish_message(id, display.unwrap_or_default(), MessageStatus::Final)?;
            }
            (None, Some(display)) => {
                let id = state
                    .log
                    .push_message(MessageRole::System, display, MessageStatus::Final);
                *reply_item = Some(id);
            }
            (None, None) => {}
        }

        let governance_item = response
            .governance
            .clone()
            .map(|card| state.log.push_governance(card));
        drop(state);

        tracing::info!(
            proposals = response.proposals.len(),
            governance = response
                .governance
                .as_ref()
                .map(|card| card.state().to_string())
                .unwrap_or_else(|| "-".into()),
            used_fallback,
            "submission completed"
        );

        Ok(Outcome::Done(SubmitReport {
            operator_item: operator_item.to_string(),
            reply_item: reply_item.clone(),
            governance_item,
            response,
            used_fallback,
        }))
    }

    /// One request against `url`, decoded as a stream or a whole body.
    async fn exchange(
        &self,
        url: &str,
        payload: &Value,
        reply_item: &mut Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Outcome<NormalizedResponse>, DeskError> {
        let raw = match self.transport.send(url, payload, cancel).await {
            Ok(raw) => raw,
            Err(TransportError::Cancelled) => return Ok(Outcome::Cancelled),
            Err(e) => return Err(e.into()),
        };

        match classify_response(raw) {
            Classified::Body(raw) => match raw.text(cancel).await {
                Ok(body) => Ok(Outcome::Done(normalize_body(&body, self.options))),
                Err(TransportError::Cancelled) => Ok(Outcome::Cancelled),
                Err(e) => Err(e.into()),
            },
            Classified::Stream(mut frames) => {
                let mut collected = CollectedStream::default();
                loop {
                    let next = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Ok(Outcome::Cancelled),
                        next = frames.next() => next,
                    };
                    let Some(frame) = next else { break };
                    let frame = frame?;
                    if let StreamFrame::Delta(delta) = &frame {
                        let mut state = self.lock();
                        let id = reply_item.get_or_insert_with(|| {
                            state
                                .log
                                .push_message(MessageRole::System, "", MessageStatus::Streaming)
                        });
                        state.log.append_text(id, delta)?;
                    }
                    collected.feed(frame);
                }
                Ok(Outcome::Done(normalize_stream(&collected, self.options)))
            }
        }
    }

    // ── Execution creation and approval ──────────────────────────────────

    fn proposal_at(&self, card_item: &str, index: usize) -> Result<ProposedCommand, DeskError> {
        let state = self.lock();
        let card = state.log.card(card_item)?;
        let mut proposals = ProposalSet::new(card.proposals().to_vec());
        let available = proposals.len();
        proposals
            .select(index)
            .cloned()
            .ok_or_else(|| ApprovalError::ProposalNotFound { index, available }.into())
    }

    /// Create an execution from proposal `index` of the card at `card_item`.
    /// The new execution gets its own BLOCKED card; its item id is returned.
    pub async fn create_execution(
        &self,
        card_item: &str,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<Outcome<String>, DeskError> {
        let proposal = self.proposal_at(card_item, index)?;
        let _busy = self.acquire(Busy::Approval)?;
        self.lock().error = None;

        let result = match self.orchestrator.create_execution(&proposal, cancel).await {
            Ok(Outcome::Done(ticket)) => {
                let card = ticket.card(&proposal);
                let mut state = self.lock();
                if let Some(text) = ticket.response.display_text.clone() {
                    state
                        .log
                        .push_message(MessageRole::System, text, MessageStatus::Final);
                }
                Ok(Outcome::Done(state.log.push_governance(card)))
            }
            Ok(Outcome::Cancelled) => Ok(Outcome::Cancelled),
            Err(e) => Err(e),
        };
        self.record(result)
    }

    /// Approve the execution behind the card at `card_item` using the id
    /// supplied for this call. Patches from an open preview of the same card
    /// are sent with it.
    pub async fn approve(
        &self,
        card_item: &str,
        approval_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Outcome<()>, DeskError> {
        let Some(approval_id) = approval_id.map(str::trim).filter(|id| !id.is_empty()) else {
            tracing::warn!(card_item, "approval refused: no approval id supplied");
            return Err(ApprovalError::MissingApprovalId.into());
        };

        let patches = {
            let state = self.lock();
            let card = state.log.card(card_item)?;
            if card.state() == GovernanceState::Executed {
                return Err(SessionError::ItemSealed(card_item.to_string()).into());
            }
            if let Some(existing) = card.approval_id()
                && existing != approval_id
            {
                return Err(GovernanceError::ApprovalIdLocked {
                    existing: existing.to_string(),
                    attempted: approval_id.to_string(),
                }
                .into());
            }
            match &state.preview {
                Some((owner, session)) if owner == card_item => {
                    let errors = session.preview().error_count();
                    if errors > 0 {
                        return Err(ApprovalError::BlockedByValidation { count: errors }.into());
                    }
                    session.patches().clone()
                }
                _ => PatchSet::new(),
            }
        };

        let _busy = self.acquire(Busy::Approval)?;
        self.lock().error = None;

        let result = match self.orchestrator.approve(approval_id, &patches, cancel).await {
            Ok(Outcome::Done(receipt)) => {
                self.apply_receipt(card_item, approval_id, &receipt.response)
            }
            Ok(Outcome::Cancelled) => Ok(Outcome::Cancelled),
            Err(e) => Err(e),
        };
        self.record(result)
    }

    fn apply_receipt(
        &self,
        card_item: &str,
        approval_id: &str,
        response: &NormalizedResponse,
    ) -> Result<Outcome<()>, DeskError> {
        let outcome = response.execution_outcome();
        let reported = response.governance.as_ref();
        let update = CardUpdate {
            title: Some(default_title(GovernanceState::Approved, 0, None)),
            summary: reported.and_then(|c| c.summary().map(str::to_string)),
            reasons: reported.map(|c| c.reasons().to_vec()).unwrap_or_default(),
            approval_id: Some(approval_id.to_string()),
            execution_id: response.execution_id.clone(),
        };

        let mut state = self.lock();
        state.log.update_card(card_item, |card| {
            if card.state() == GovernanceState::Blocked {
                card.advance(GovernanceState::Approved, update)?;
            } else {
                card.enrich(update)?;
            }
            if let Some(outcome) = &outcome
                && outcome.is_terminal()
            {
                card.advance(
                    GovernanceState::Executed,
                    CardUpdate {
                        title: Some(default_title(GovernanceState::Executed, 0, Some(outcome))),
                        ..CardUpdate::default()
                    },
                )?;
            }
            Ok(())
        })?;

        if let Some(text) = response.display_text.clone() {
            state
                .log
                .push_message(MessageRole::System, text, MessageStatus::Final);
        }
        if state
            .preview
            .as_ref()
            .is_some_and(|(owner, _)| owner == card_item)
        {
            state.preview = None;
        }
        tracing::info!(card_item, approval_id, "approval applied");
        Ok(Outcome::Done(()))
    }

    // ── Preview ──────────────────────────────────────────────────────────

    /// Fetch a fresh preview for proposal `index` of the card at
    /// `card_item`, replacing any open preview.
    pub async fn open_preview(
        &self,
        card_item: &str,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<Outcome<()>, DeskError> {
        let proposal = self.proposal_at(card_item, index)?;
        let _busy = self.acquire(Busy::Approval)?;

        let result = match self
            .orchestrator
            .preview(&proposal, &PatchSet::new(), cancel)
            .await
        {
            Ok(Outcome::Done(preview)) => {
                self.lock().preview =
                    Some((card_item.to_string(), PreviewSession::new(proposal, preview)));
                Ok(Outcome::Done(()))
            }
            Ok(Outcome::Cancelled) => Ok(Outcome::Cancelled),
            Err(e) => Err(e),
        };
        self.record(result)
    }

    /// Record an edit in the open preview. Returns false for unknown rows.
    pub fn edit_field(&self, op_id: &str, field: &str, value: Value) -> Result<bool, SessionError> {
        let mut state = self.lock();
        let (_, session) = state.preview.as_mut().ok_or(SessionError::NoPreview)?;
        Ok(session.edit_field(op_id, field, value))
    }

    pub fn clear_field(&self, op_id: &str, field: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        let (_, session) = state.preview.as_mut().ok_or(SessionError::NoPreview)?;
        session.clear_field(op_id, field);
        Ok(())
    }

    /// Re-fetch the open preview with pending edits applied server-side.
    /// The edits are dropped once the new preview arrives.
    pub async fn refresh_preview(&self, cancel: &CancellationToken) -> Result<Outcome<()>, DeskError> {
        let (owner, proposal, patches) = {
            let state = self.lock();
            let (owner, session) = state.preview.as_ref().ok_or(SessionError::NoPreview)?;
            (
                owner.clone(),
                session.proposal().clone(),
                session.patches().clone(),
            )
        };
        let _busy = self.acquire(Busy::Approval)?;

        let result = match self.orchestrator.preview(&proposal, &patches, cancel).await {
            Ok(Outcome::Done(preview)) => {
                let mut state = self.lock();
                let refreshed = match state.preview.take() {
                    Some((current, session)) if current == owner => session.refreshed(preview),
                    _ => PreviewSession::new(proposal, preview),
                };
                state.preview = Some((owner, refreshed));
                Ok(Outcome::Done(()))
            }
            Ok(Outcome::Cancelled) => Ok(Outcome::Cancelled),
            Err(e) => Err(e),
        };
        self.record(result)
    }

    pub fn close_preview(&self) {
        self.lock().preview = None;
    }
}
