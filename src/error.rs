use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `IrisDesk`.
///
/// Each subsystem defines its own error variant. Callers match on these to
/// decide what reaches the operator-facing error slot; the binary and the
/// config loader continue to use `anyhow::Result` for context chains.
#[derive(Debug, Error)]
pub enum DeskError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Transport ────────────────────────────────────────────────────────
    #[error(transparent)]
    Transport(#[from] TransportError),

    // ── Stream framing ───────────────────────────────────────────────────
    #[error("stream: {0}")]
    Stream(#[from] StreamError),

    // ── Governance lifecycle ─────────────────────────────────────────────
    #[error("governance: {0}")]
    Governance(#[from] GovernanceError),

    // ── Approval protocol ────────────────────────────────────────────────
    #[error("approval: {0}")]
    Approval(#[from] ApprovalError),

    // ── Session / controller ─────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    /// True when the error only signals that the caller cancelled the action.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::Cancelled) | Self::Stream(StreamError::Cancelled)
        )
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid endpoint {path}: {message}")]
    Endpoint { path: String, message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success status. Status and body are kept exactly as received.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("failed to read response body: {0}")]
    Read(String),

    #[error("failed to encode request payload: {0}")]
    Encode(String),

    #[error("exchange cancelled")]
    Cancelled,
}

// ─── Stream errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("read failed mid-stream: {0}")]
    Read(String),

    #[error("stream cancelled")]
    Cancelled,
}

impl From<TransportError> for StreamError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Cancelled => Self::Cancelled,
            other => Self::Read(other.to_string()),
        }
    }
}

// ─── Governance errors ──────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("approval id already attached ({existing}); refusing to replace with {attempted}")]
    ApprovalIdLocked { existing: String, attempted: String },
}

// ─── Approval errors ────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("approval requires an explicit approval id for this call")]
    MissingApprovalId,

    #[error("no proposal at index {index} (card holds {available})")]
    ProposalNotFound { index: usize, available: usize },

    #[error("execution response carried neither an execution id nor an approval id")]
    EmptyExecution,

    #[error("preview carries {count} error-severity validation issue(s)")]
    BlockedByValidation { count: usize },

    #[error("preview reply could not be read: {0}")]
    MalformedPreview(String),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a submission is already in flight")]
    SubmissionBusy,

    #[error("an approval call is already in flight")]
    ApprovalBusy,

    #[error("chat item not found: {0}")]
    ItemNotFound(String),

    #[error("chat item {0} is not a governance event")]
    NotGovernance(String),

    #[error("chat item {0} already reached a terminal status")]
    ItemSealed(String),

    #[error("no preview session is open")]
    NoPreview,

    #[error("command text is empty")]
    EmptyCommand,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, DeskError>;
