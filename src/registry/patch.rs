use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Operator edits for one batch row, sent beside the proposal on the next
/// preview or approval round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPatch {
    pub op_id: String,
    pub changes: Map<String, Value>,
}

/// Client-held patches keyed by op id. Never merged into a proposal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    entries: BTreeMap<String, Map<String, Value>>,
}

fn clears(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record an edit. A null or blank value clears the field instead.
    pub fn set_field(&mut self, op_id: &str, field: &str, value: Value) {
        if clears(&value) {
            self.clear_field(op_id, field);
            return;
        }
        self.entries
            .entry(op_id.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Drop one edited field; a row left with no edits is dropped entirely.
    pub fn clear_field(&mut self, op_id: &str, field: &str) {
        if let Some(changes) = self.entries.get_mut(op_id) {
            changes.remove(field);
            if changes.is_empty() {
                self.entries.remove(op_id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, op_id: &str, field: &str) -> Option<&Value> {
        self.entries.get(op_id).and_then(|changes| changes.get(field))
    }

    pub fn patches(&self) -> Vec<FieldPatch> {
        self.entries
            .iter()
            .map(|(op_id, changes)| FieldPatch {
                op_id: op_id.clone(),
                changes: changes.clone(),
            })
            .collect()
    }

    /// Wire form: a JSON array of `{op_id, changes}`.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.patches()
                .into_iter()
                .map(|patch| {
                    let mut object = Map::new();
                    object.insert("op_id".into(), Value::String(patch.op_id));
                    object.insert("changes".into(), Value::Object(patch.changes));
                    Value::Object(object)
                })
                .collect(),
        )
    }
}
