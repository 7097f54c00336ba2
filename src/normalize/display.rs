use serde_json::Value;

/// Line keys (text before the first `:`) that only describe backend
/// plumbing.
const INTERNAL_KEYS: &[&str] = &[
    "agent",
    "agent id",
    "agent name",
    "tool",
    "tool id",
    "tool name",
    "tool call",
    "executor",
    "executor id",
    "sdk",
    "sdk version",
    "runner",
    "trace id",
];

fn line_key(line: &str) -> Option<String> {
    let trimmed = line
        .trim_start()
        .trim_start_matches(['-', '*', '•'])
        .trim_start();
    let (key, _) = trimmed.split_once(':')?;
    let key = key.trim().to_ascii_lowercase().replace(['_', '-'], " ");
    Some(key)
}

fn is_internal(line: &str) -> bool {
    line_key(line).is_some_and(|key| INTERNAL_KEYS.contains(&key.as_str()))
}

/// Drop agent/tool/executor/SDK detail lines. Surrounding blank lines are
/// trimmed; everything else keeps its order and spacing.
pub fn filter_internal_lines(text: &str) -> String {
    let kept: Vec<&str> = text.lines().filter(|line| !is_internal(line)).collect();
    kept.join("\n").trim_matches('\n').to_string()
}

/// Line-based summary for replies that report an execution but carry no
/// text.
pub fn synthetic_summary(
    reply: &Value,
    execution_state: Option<&str>,
    execution_id: Option<&str>,
    approval_id: Option<&str>,
) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(state) = execution_state {
        lines.push(format!("Execution state: {state}"));
    }
    if let Some(id) = execution_id {
        lines.push(format!("Execution id: {id}"));
    }
    if let Some(id) = approval_id {
        lines.push(format!("Approval id: {id}"));
    }
    if let Some(error) = reply
        .get("error")
        .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(Value::as_str)))
    {
        lines.push(format!("Error: {error}"));
    }
    if let Some(detail) = reply
        .get("approval")
        .and_then(|a| a.get("message").or_else(|| a.get("detail")))
        .and_then(Value::as_str)
    {
        lines.push(format!("Approval: {detail}"));
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}
