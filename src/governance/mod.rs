pub mod card;
pub mod state;

pub use card::{CardUpdate, GovernanceCard, default_title};
pub use state::{ExecutionOutcome, GovernanceState};
