use super::chat::ChatLog;
use crate::registry::PreviewSession;

/// Which in-flight action a busy flag guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    Submission,
    Approval,
}

/// Everything one console session owns. Nothing here is shared across
/// sessions; approval ids live only on their cards.
#[derive(Debug, Default)]
pub struct SessionState {
    pub log: ChatLog,
    pub submitting: bool,
    pub approving: bool,
    /// Last submitted text, kept until a submission succeeds.
    pub draft: Option<String>,
    /// Operator-facing error from the last failed action.
    pub error: Option<String>,
    /// Open preview and the governance item it belongs to.
    pub preview: Option<(String, PreviewSession)>,
}

impl SessionState {
    pub fn is_busy(&self, busy: Busy) -> bool {
        match busy {
            Busy::Submission => self.submitting,
            Busy::Approval => self.approving,
        }
    }

    pub fn set_busy(&mut self, busy: Busy, value: bool) {
        match busy {
            Busy::Submission => self.submitting = value,
            Busy::Approval => self.approving = value,
        }
    }
}
