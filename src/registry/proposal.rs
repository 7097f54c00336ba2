use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const NAME_FIELDS: [&str; 3] = ["command", "command_name", "commandName"];
const INTENT_FIELDS: [&str; 1] = ["intent"];
const TYPE_FIELDS: [&str; 3] = ["command_type", "commandType", "type"];

/// Containers that may hold the record fields of a proposal, in lookup order.
const PROPERTY_CONTAINERS: [&[&str]; 4] = [
    &["properties"],
    &["payload", "properties"],
    &["payload"],
    &["fields"],
];

/// A backend-proposed command, held exactly as received.
///
/// No mutable access is exposed. The stored object is the execution-creation
/// payload and goes back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposedCommand(Map<String, Value>);

impl ProposedCommand {
    /// Wrap a JSON object. Any other JSON kind is rejected.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|map| Self(map.clone()))
    }

    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The value sent to the execution-creation endpoint.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Display label: command name, then intent, then command type, then a
    /// 1-based synthetic index.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        [&NAME_FIELDS[..], &INTENT_FIELDS[..], &TYPE_FIELDS[..]]
            .iter()
            .find_map(|fields| {
                fields.iter().find_map(|field| {
                    self.0
                        .get(*field)
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                })
            })
            .map_or_else(|| format!("Proposal {}", index + 1), str::to_string)
    }

    /// Record fields carried by the proposal, for missing-field prompts.
    #[must_use]
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        PROPERTY_CONTAINERS.iter().find_map(|path| {
            let (first, rest) = path.split_first()?;
            let mut current = self.0.get(*first)?;
            for key in rest {
                current = current.get(*key)?;
            }
            current.as_object()
        })
    }

    /// Target record type (`db_key`), when the proposal names one.
    #[must_use]
    pub fn db_key(&self) -> Option<&str> {
        ["db_key", "dbKey"]
            .iter()
            .find_map(|field| self.0.get(*field).and_then(Value::as_str))
            .or_else(|| {
                self.0
                    .get("payload")
                    .and_then(|p| p.get("db_key"))
                    .and_then(Value::as_str)
            })
    }
}

/// The proposals of one reply, with at most one selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalSet {
    proposals: Vec<ProposedCommand>,
    selected: Option<usize>,
}

impl ProposalSet {
    #[must_use]
    pub fn new(proposals: Vec<ProposedCommand>) -> Self {
        let selected = (proposals.len() == 1).then_some(0);
        Self {
            proposals,
            selected,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProposedCommand> {
        self.proposals.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ProposedCommand> {
        self.proposals.get(index)
    }

    /// Labels in order, for list rendering.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.proposals
            .iter()
            .enumerate()
            .map(|(i, p)| p.label(i))
            .collect()
    }

    /// Select exactly one proposal, replacing any earlier selection.
    pub fn select(&mut self, index: usize) -> Option<&ProposedCommand> {
        let proposal = self.proposals.get(index)?;
        self.selected = Some(index);
        Some(proposal)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ProposedCommand> {
        self.selected.and_then(|i| self.proposals.get(i))
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }
}
