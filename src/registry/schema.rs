use super::lenient;
use super::proposal::ProposedCommand;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Server-declared description of one record field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", alias = "kind", default, deserialize_with = "lenient::opt_text")]
    pub kind: Option<String>,
    /// Allowed values as sent: plain strings or option objects.
    #[serde(default, deserialize_with = "lenient::list")]
    pub options: Vec<Value>,
    #[serde(default, alias = "readOnly", alias = "read-only")]
    pub read_only: bool,
}

/// Field name to spec for one target record type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldSchema(BTreeMap<String, FieldSpec>);

impl<'de> Deserialize<'de> for FieldSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_value(&Value::deserialize(deserializer)?))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

impl FieldSchema {
    pub fn new(fields: impl IntoIterator<Item = (String, FieldSpec)>) -> Self {
        Self(fields.into_iter().collect())
    }

    /// Parse a schema object, skipping entries that are not field specs.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        Self(
            map.iter()
                .filter_map(|(name, spec)| {
                    match serde_json::from_value::<FieldSpec>(spec.clone()) {
                        Ok(spec) => Some((name.clone(), spec)),
                        Err(e) => {
                            tracing::debug!(field = name.as_str(), "skipping field spec: {e}");
                            None
                        }
                    }
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn merge(&mut self, other: &FieldSchema) {
        for (name, spec) in &other.0 {
            self.0.entry(name.clone()).or_insert_with(|| spec.clone());
        }
    }

    /// Writable fields the proposal leaves absent or blank, in schema order.
    pub fn missing_fields<'a>(&'a self, proposal: &ProposedCommand) -> Vec<&'a str> {
        let properties = proposal.properties();
        self.0
            .iter()
            .filter(|(_, spec)| !spec.read_only)
            .filter(|(name, _)| {
                properties
                    .and_then(|props| props.get(name.as_str()))
                    .is_none_or(is_blank)
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
