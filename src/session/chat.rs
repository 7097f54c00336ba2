use crate::error::{DeskError, GovernanceError, SessionError};
use crate::governance::{GovernanceCard, GovernanceState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageRole {
    Operator,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageStatus {
    Sending,
    Streaming,
    Final,
    Error,
}

impl MessageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Final | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatItemKind {
    Message {
        role: MessageRole,
        text: String,
        status: MessageStatus,
    },
    GovernanceEvent {
        card: GovernanceCard,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ChatItemKind,
}

impl ChatItem {
    fn new(kind: ChatItemKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            kind,
        }
    }

    /// Terminal items no longer accept updates.
    pub fn is_sealed(&self) -> bool {
        match &self.kind {
            ChatItemKind::Message { status, .. } => status.is_terminal(),
            ChatItemKind::GovernanceEvent { card } => card.state() == GovernanceState::Executed,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ChatItemKind::Message { text, .. } => Some(text),
            ChatItemKind::GovernanceEvent { .. } => None,
        }
    }

    pub fn card(&self) -> Option<&GovernanceCard> {
        match &self.kind {
            ChatItemKind::GovernanceEvent { card } => Some(card),
            ChatItemKind::Message { .. } => None,
        }
    }
}

/// Ordered, append-only list of chat items. Items are updated in place by
/// id and never reordered or removed.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    items: Vec<ChatItem>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ChatItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ChatItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn push_message(
        &mut self,
        role: MessageRole,
        text: impl Into<String>,
        status: MessageStatus,
    ) -> String {
        self.push(ChatItemKind::Message {
            role,
            text: text.into(),
            status,
        })
    }

    pub fn push_governance(&mut self, card: GovernanceCard) -> String {
        self.push(ChatItemKind::GovernanceEvent { card })
    }

    fn push(&mut self, kind: ChatItemKind) -> String {
        let item = ChatItem::new(kind);
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    fn open_item(&mut self, id: &str) -> Result<&mut ChatItem, SessionError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| SessionError::ItemNotFound(id.to_string()))?;
        if item.is_sealed() {
            return Err(SessionError::ItemSealed(id.to_string()));
        }
        Ok(item)
    }

    /// Append a streamed delta and mark the message as streaming.
    pub fn append_text(&mut self, id: &str, delta: &str) -> Result<(), SessionError> {
        let item = self.open_item(id)?;
        match &mut item.kind {
            ChatItemKind::Message { text, status, .. } => {
                text.push_str(delta);
                *status = MessageStatus::Streaming;
            }
            ChatItemKind::GovernanceEvent { .. } => {
                return Err(SessionError::ItemNotFound(id.to_string()));
            }
        }
        item.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_status(&mut self, id: &str, new_status: MessageStatus) -> Result<(), SessionError> {
        let item = self.open_item(id)?;
        match &mut item.kind {
            ChatItemKind::Message { status, .. } => *status = new_status,
            ChatItemKind::GovernanceEvent { .. } => {
                return Err(SessionError::ItemNotFound(id.to_string()));
            }
        }
        item.updated_at = Utc::now();
        Ok(())
    }

    /// Replace a message's text and status in one step.
    pub fn finish_message(
        &mut self,
        id: &str,
        final_text: String,
        new_status: MessageStatus,
    ) -> Result<(), SessionError> {
        let item = self.open_item(id)?;
        match &mut item.kind {
            ChatItemKind::Message { text, status, .. } => {
                *text = final_text;
                *status = new_status;
            }
            ChatItemKind::GovernanceEvent { .. } => {
                return Err(SessionError::ItemNotFound(id.to_string()));
            }
        }
        item.updated_at = Utc::now();
        Ok(())
    }

    pub fn card(&self, id: &str) -> Result<&GovernanceCard, SessionError> {
        let item = self
            .get(id)
            .ok_or_else(|| SessionError::ItemNotFound(id.to_string()))?;
        item.card()
            .ok_or_else(|| SessionError::NotGovernance(id.to_string()))
    }

    /// Update a governance card. The change is applied to a copy and only
    /// committed when `apply` succeeds.
    pub fn update_card(
        &mut self,
        id: &str,
        apply: impl FnOnce(&mut GovernanceCard) -> Result<(), GovernanceError>,
    ) -> Result<(), DeskError> {
        let item = self.open_item(id)?;
        let ChatItemKind::GovernanceEvent { card } = &mut item.kind else {
            return Err(SessionError::NotGovernance(id.to_string()).into());
        };
        let mut updated = card.clone();
        apply(&mut updated)?;
        *card = updated;
        item.updated_at = Utc::now();
        Ok(())
    }
}
