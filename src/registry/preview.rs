use super::batch::BatchPreview;
use super::patch::PatchSet;
use super::proposal::ProposedCommand;
use super::schema::FieldSchema;
use serde_json::Value;

/// One open preview: the proposal it was fetched for, the server preview,
/// and the operator's pending edits. Rebuilt on every preview fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSession {
    proposal: ProposedCommand,
    preview: BatchPreview,
    patches: PatchSet,
}

impl PreviewSession {
    pub fn new(proposal: ProposedCommand, preview: BatchPreview) -> Self {
        Self {
            proposal,
            preview,
            patches: PatchSet::new(),
        }
    }

    pub fn proposal(&self) -> &ProposedCommand {
        &self.proposal
    }

    pub fn preview(&self) -> &BatchPreview {
        &self.preview
    }

    pub fn patches(&self) -> &PatchSet {
        &self.patches
    }

    pub fn has_operation(&self, op_id: &str) -> bool {
        self.preview.operation(op_id).is_some()
    }

    /// Returns false, recording nothing, when `op_id` is not a row of this
    /// preview.
    pub fn edit_field(&mut self, op_id: &str, field: &str, value: Value) -> bool {
        if !self.has_operation(op_id) {
            tracing::warn!(op_id, "edit for unknown batch operation ignored");
            return false;
        }
        self.patches.set_field(op_id, field, value);
        true
    }

    pub fn clear_field(&mut self, op_id: &str, field: &str) {
        self.patches.clear_field(op_id, field);
    }

    /// Combined schema: preview-level declarations plus each row's own.
    pub fn schema(&self) -> FieldSchema {
        let mut schema = self.preview.schema.clone();
        for op in &self.preview.operations {
            schema.merge(&op.property_spec);
        }
        schema
    }

    /// Writable schema fields the proposal does not fill.
    pub fn missing_fields(&self) -> Vec<String> {
        self.schema()
            .missing_fields(&self.proposal)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Replace the server preview after a refresh. Pending edits are dropped.
    pub fn refreshed(self, preview: BatchPreview) -> Self {
        Self::new(self.proposal, preview)
    }
}
