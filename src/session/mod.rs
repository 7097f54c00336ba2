pub mod chat;
pub mod controller;
pub mod state;

pub use chat::{ChatItem, ChatItemKind, ChatLog, MessageRole, MessageStatus};
pub use controller::{Console, SubmitReport};
pub use state::{Busy, SessionState};
