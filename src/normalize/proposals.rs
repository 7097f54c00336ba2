use super::aliases::resolve_proposal_container;
use crate::registry::ProposedCommand;
use serde_json::Value;

/// Proposals from the first known container holding an array. Entries that
/// are not JSON objects are dropped; objects are kept exactly as received.
pub fn extract_proposals(reply: &Value) -> Vec<ProposedCommand> {
    let Some(entries) = resolve_proposal_container(reply) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let proposal = ProposedCommand::from_value(entry);
            if proposal.is_none() {
                tracing::warn!(index, "discarding proposal entry that is not an object");
            }
            proposal
        })
        .collect()
}
