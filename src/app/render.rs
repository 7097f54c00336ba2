use crate::ui::style as ui;
use irisdesk::Config;
use irisdesk::governance::GovernanceCard;
use irisdesk::normalize::NormalizedResponse;
use irisdesk::orchestrator::Endpoints;
use irisdesk::registry::PreviewSession;
use irisdesk::session::{ChatItem, ChatItemKind, MessageRole, MessageStatus};
use serde_json::Value;
use std::fmt::Write;

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_card(card: &GovernanceCard) -> String {
    let mut out = format!("{} {}", ui::state_badge(card.state()), ui::header(card.title()));
    if let Some(summary) = card.summary() {
        let _ = write!(out, "\n  {summary}");
    }
    for reason in card.reasons() {
        let _ = write!(out, "\n  {} {reason}", ui::accent("•"));
    }
    if let Some(id) = card.approval_id() {
        let _ = write!(out, "\n  {}", ui::dim(format!("approval id: {id}")));
    }
    if let Some(id) = card.execution_id() {
        let _ = write!(out, "\n  {}", ui::dim(format!("execution id: {id}")));
    }
    for (index, proposal) in card.proposals().iter().enumerate() {
        let _ = write!(
            out,
            "\n  {} {}",
            ui::accent(format!("{}.", index + 1)),
            proposal.label(index)
        );
    }
    out
}

pub fn render_item(item: &ChatItem) -> String {
    match &item.kind {
        ChatItemKind::Message { role, text, status } => {
            let text = match status {
                MessageStatus::Error => ui::error(text),
                _ => text.clone(),
            };
            match role {
                MessageRole::Operator => format!("{} {text}", ui::accent("›")),
                MessageRole::System => text,
            }
        }
        ChatItemKind::GovernanceEvent { card } => render_card(card),
    }
}

pub fn render_response(response: &NormalizedResponse) -> String {
    let mut parts = Vec::new();
    if let Some(text) = &response.display_text {
        parts.push(text.clone());
    }
    if let Some(card) = &response.governance {
        parts.push(render_card(card));
    }
    if parts.is_empty() {
        parts.push(ui::dim("(empty reply)"));
    }
    parts.join("\n")
}

/// Rows of the open preview as an aligned table, pending edits marked with
/// `*`, followed by its validation issues.
pub fn render_preview(session: &PreviewSession) -> String {
    let preview = session.preview();
    let columns = preview.columns();
    let mut header = vec!["op".to_string()];
    header.extend(columns.iter().cloned());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for op in &preview.operations {
        let mut row = vec![op.op_id.clone()];
        for column in &columns {
            let text = match session.patches().get(&op.op_id, column) {
                Some(patched) => format!("{}*", cell(patched)),
                None => op.property_preview.get(column).map(cell).unwrap_or_default(),
            };
            row.push(text);
        }
        rows.push(row);
    }

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = ui::header(line(&header));
    for row in &rows {
        let _ = write!(out, "\n{}", line(row));
    }

    let (errors, warnings) = preview.partition_issues();
    for issue in errors.iter().chain(&warnings) {
        let location = match (&issue.op_id, &issue.field) {
            (Some(op), Some(field)) => format!("{op}.{field}"),
            (Some(op), None) => op.clone(),
            (None, Some(field)) => field.clone(),
            (None, None) => "batch".into(),
        };
        let mut text = format!("{location}: {}", issue.message);
        if let Some(allowed) = &issue.allowed {
            let allowed: Vec<String> = allowed.iter().map(cell).collect();
            let _ = write!(text, " (allowed: {})", allowed.join(", "));
        }
        let _ = write!(out, "\n{}", ui::severity(issue.severity, text));
    }
    out
}

pub fn render_config(config: &Config) -> anyhow::Result<String> {
    let endpoints = Endpoints::from_config(&config.backend)?;
    let mut out = format!("config   {}", config.config_path.display());
    let _ = write!(out, "\ncommand  {}", endpoints.command);
    let _ = write!(out, "\nexecute  {}", endpoints.execute);
    let _ = write!(out, "\napprove  {}", endpoints.approve);
    let _ = write!(out, "\npreview  {}", endpoints.preview);
    let _ = write!(
        out,
        "\nfallback {}",
        endpoints.fallback.as_deref().unwrap_or("(none)")
    );
    let _ = write!(
        out,
        "\napi key  {}",
        if config.backend.api_key.is_some() {
            "set"
        } else {
            "(none)"
        }
    );
    let _ = write!(out, "\nlog      {}", config.observability.log_level);
    Ok(out)
}
