pub mod approval;
pub mod endpoints;
pub mod outcome;

pub use approval::{ApprovalOrchestrator, ApprovalReceipt, ExecutionTicket};
pub use endpoints::Endpoints;
pub use outcome::Outcome;
