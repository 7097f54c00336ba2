pub mod batch;
mod lenient;
pub mod patch;
pub mod preview;
pub mod proposal;
pub mod schema;

pub use batch::{BatchOperation, BatchPreview, Severity, ValidationIssue};
pub use patch::{FieldPatch, PatchSet};
pub use preview::PreviewSession;
pub use proposal::{ProposalSet, ProposedCommand};
pub use schema::{FieldSchema, FieldSpec};
