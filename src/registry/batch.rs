use super::lenient;
use super::schema::FieldSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// `error`, `fatal`, `critical` and `blocking` block approval. Any other
    /// grade (`warning`, `info`, `notice`, ...) is advisory.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" | "err" | "fatal" | "critical" | "blocker" | "blocking" => Self::Error,
            _ => Self::Warning,
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => Self::parse(&raw),
            Value::Null => Self::Error,
            _ => Self::Warning,
        })
    }
}

/// An issue the backend did not grade blocks approval.
fn ungraded() -> Severity {
    Severity::Error
}

/// Backend-reported problem with a row or field. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(default, alias = "opId", deserialize_with = "lenient::opt_text")]
    pub op_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub field: Option<String>,
    #[serde(default = "ungraded", alias = "level")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "lenient::text")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient::opt_list")]
    pub allowed: Option<Vec<Value>>,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// One row of a multi-operation batch proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOperation {
    #[serde(alias = "opId", deserialize_with = "lenient::text")]
    pub op_id: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub intent: Option<String>,
    #[serde(default, alias = "dbKey", deserialize_with = "lenient::opt_text")]
    pub db_key: Option<String>,
    #[serde(
        default,
        alias = "propertyPreview",
        alias = "properties",
        deserialize_with = "lenient::object"
    )]
    pub property_preview: Map<String, Value>,
    #[serde(default, alias = "propertySpec")]
    pub property_spec: FieldSchema,
    #[serde(default, alias = "issues")]
    pub validation: Vec<ValidationIssue>,
}

fn collect_refs(value: &Value, known: &[&str], own: &str, out: &mut Vec<String>) {
    let mut push = |candidate: &str| {
        if candidate != own && known.contains(&candidate) && !out.iter().any(|r| r == candidate) {
            out.push(candidate.to_string());
        }
    };
    match value {
        Value::String(s) => push(s.strip_prefix('$').unwrap_or(s)),
        Value::Array(items) => {
            for item in items {
                collect_refs(item, known, own, out);
            }
        }
        Value::Object(map) => {
            if let Some(target) = map
                .get("op_ref")
                .or_else(|| map.get("opRef"))
                .and_then(Value::as_str)
            {
                push(target);
            }
            for (key, nested) in map {
                if key != "op_ref" && key != "opRef" {
                    collect_refs(nested, known, own, out);
                }
            }
        }
        _ => {}
    }
}

impl BatchOperation {
    /// Other operations of the same batch this row points at, in first-seen
    /// order. Accepts `"op_1"`, `"$op_1"` and `{"op_ref": "op_1"}`.
    pub fn references(&self, known_op_ids: &[&str]) -> Vec<String> {
        let mut refs = Vec::new();
        for value in self.property_preview.values() {
            collect_refs(value, known_op_ids, &self.op_id, &mut refs);
        }
        refs
    }
}

/// Sort bucket for table columns; lower sorts first.
fn column_rank(field: &str) -> u8 {
    let lower = field.to_ascii_lowercase();
    let lower = lower.as_str();
    if lower == "id" || lower == "op_id" || lower.ends_with("_id") || lower.ends_with(" id") {
        0
    } else if matches!(lower, "name" | "title") {
        1
    } else if matches!(lower, "status" | "state") {
        2
    } else if lower == "priority" {
        3
    } else if lower.contains("date")
        || lower.contains("due")
        || lower.contains("deadline")
        || lower.ends_with("_at")
    {
        4
    } else if matches!(
        lower,
        "description" | "notes" | "note" | "body" | "content" | "summary" | "comment" | "details"
    ) {
        6
    } else {
        5
    }
}

/// Server preview of a batch: ordered rows plus batch-level issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPreview {
    #[serde(default)]
    pub operations: Vec<BatchOperation>,
    #[serde(default, alias = "validation")]
    pub issues: Vec<ValidationIssue>,
    #[serde(default, alias = "property_spec", alias = "propertySpec")]
    pub schema: FieldSchema,
}

const PREVIEW_CONTAINERS: [&str; 3] = ["preview", "batch", "result"];

impl BatchPreview {
    /// Read a preview from a reply body. The rows are looked for at the top
    /// level first and then under `preview`, `batch` or `result`; a body
    /// with no rows anywhere is read as a batch-level preview.
    ///
    /// A body that cannot be read is an error, never an empty preview, so
    /// reported issues cannot be lost on the way to the approval gate.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let candidate = std::iter::once(value)
            .chain(PREVIEW_CONTAINERS.iter().filter_map(|key| value.get(*key)))
            .find(|v| v.get("operations").is_some_and(Value::is_array))
            .unwrap_or(value);
        serde_json::from_value(candidate.clone())
    }

    pub fn op_ids(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.op_id.as_str()).collect()
    }

    pub fn operation(&self, op_id: &str) -> Option<&BatchOperation> {
        self.operations.iter().find(|op| op.op_id == op_id)
    }

    /// Union of row fields and schema fields, ranked for display.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let mut add = |name: &str| {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        };
        for op in &self.operations {
            op.property_preview.keys().for_each(|k| add(k.as_str()));
        }
        for op in &self.operations {
            op.property_spec.fields().for_each(|(k, _)| add(k));
        }
        self.schema.fields().for_each(|(k, _)| add(k));

        columns.sort_by_key(|c| column_rank(c));
        columns
    }

    /// Batch-level and row-level issues, with row issues tagged by op id.
    pub fn all_issues(&self) -> Vec<ValidationIssue> {
        let mut issues = self.issues.clone();
        for op in &self.operations {
            issues.extend(op.validation.iter().map(|issue| {
                let mut issue = issue.clone();
                if issue.op_id.is_none() {
                    issue.op_id = Some(op.op_id.clone());
                }
                issue
            }));
        }
        issues
    }

    /// `(errors, warnings)`.
    pub fn partition_issues(&self) -> (Vec<ValidationIssue>, Vec<ValidationIssue>) {
        self.all_issues().into_iter().partition(ValidationIssue::is_error)
    }

    /// Issues for one row, optionally narrowed to one field.
    pub fn issues_for(&self, op_id: &str, field: Option<&str>) -> Vec<ValidationIssue> {
        self.all_issues()
            .into_iter()
            .filter(|issue| issue.op_id.as_deref() == Some(op_id))
            .filter(|issue| field.is_none() || issue.field.as_deref() == field)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.all_issues().iter().filter(|i| i.is_error()).count()
    }

    /// Errors block approval; they never block editing.
    pub fn can_approve(&self) -> bool {
        self.error_count() == 0
    }
}
