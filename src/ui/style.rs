use console::style;
use irisdesk::governance::GovernanceState;
use irisdesk::registry::Severity;
use std::fmt::Display;

/// Green bold: completed actions
pub fn success<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

/// White bold: card titles, table headers
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim: ids, timestamps, hints
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Red bold: transport failures, error-severity issues
pub fn error<D: Display>(text: D) -> String {
    style(text).red().bold().to_string()
}

/// Yellow: warnings
pub fn warning<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// Cyan bold: prompts, list markers
pub fn accent<D: Display>(text: D) -> String {
    style(text).cyan().bold().to_string()
}

/// Green: values the operator supplied or confirmed
pub fn value<D: Display>(text: D) -> String {
    style(text).green().to_string()
}

pub fn state_badge(state: GovernanceState) -> String {
    let label = format!("[{state}]");
    match state {
        GovernanceState::Blocked => style(label).yellow().bold().to_string(),
        GovernanceState::Approved => style(label).cyan().bold().to_string(),
        GovernanceState::Executed => style(label).green().bold().to_string(),
    }
}

pub fn severity<D: Display>(severity: Severity, text: D) -> String {
    match severity {
        Severity::Error => error(format!("✗ {text}")),
        Severity::Warning => warning(format!("! {text}")),
    }
}
