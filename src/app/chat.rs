use super::cancel::CtrlC;
use super::render::{render_item, render_preview};
use crate::ui::style as ui;
use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use irisdesk::Config;
use irisdesk::error::DeskError;
use irisdesk::governance::GovernanceState;
use irisdesk::orchestrator::Outcome;
use irisdesk::session::Console;
use serde_json::Value;

/// Print items appended since the last call.
struct Printer {
    shown: usize,
}

impl Printer {
    fn flush(&mut self, console: &Console) {
        let items = console.snapshot();
        for item in items.iter().skip(self.shown) {
            println!("{}", render_item(item));
        }
        self.shown = items.len();
    }
}

fn report(console: &Console, result: Result<Outcome<()>, DeskError>) {
    match result {
        Ok(Outcome::Done(())) => {}
        Ok(Outcome::Cancelled) => println!("{}", ui::dim("cancelled")),
        Err(e) => {
            let message = console.error().unwrap_or_else(|| e.to_string());
            println!("{}", ui::error(message));
        }
    }
}

/// `op_id.field=value`; an empty value clears the edit.
fn parse_edit(line: &str) -> Option<(&str, &str, Value)> {
    let (target, raw) = line.split_once('=')?;
    let (op_id, field) = target.trim().split_once('.')?;
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Some((op_id.trim(), field.trim(), value))
}

async fn preview_loop(console: &Console, card_item: &str, index: usize) -> Result<()> {
    {
        let ctrl_c = CtrlC::arm();
        let result = console.open_preview(card_item, index, ctrl_c.token()).await;
        if !matches!(result, Ok(Outcome::Done(()))) {
            report(console, result);
            return Ok(());
        }
    }

    loop {
        let Some(session) = console.preview() else {
            return Ok(());
        };
        println!("{}", render_preview(&session));
        for field in session.missing_fields() {
            println!("{}", ui::warning(format!("missing: {field}")));
        }

        let line: String = Input::new()
            .with_prompt("edit (op_id.field=value, blank to finish)")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        match parse_edit(line) {
            Some((op_id, field, value)) => {
                if !console.edit_field(op_id, field, value)? {
                    println!("{}", ui::warning(format!("no operation {op_id} in this preview")));
                }
            }
            None => println!("{}", ui::dim("expected op_id.field=value")),
        }
    }

    let has_edits = console.preview().is_some_and(|s| !s.patches().is_empty());
    if has_edits {
        let ctrl_c = CtrlC::arm();
        let result = console.refresh_preview(ctrl_c.token()).await;
        report(console, result);
        if let Some(session) = console.preview() {
            println!("{}", render_preview(&session));
        }
    }
    Ok(())
}

/// Offer the actions that fit the newest governance card.
async fn follow_up(console: &Console, printer: &mut Printer) -> Result<()> {
    let Some(item) = console
        .snapshot()
        .into_iter()
        .rev()
        .find(|item| item.card().is_some())
    else {
        return Ok(());
    };
    let Some(card) = item.card().cloned() else {
        return Ok(());
    };
    if card.state() != GovernanceState::Blocked {
        return Ok(());
    }

    if let Some(approval_id) = card.approval_id() {
        if let Some(index) = (!card.proposals().is_empty()).then_some(0)
            && Confirm::new()
                .with_prompt("Preview before approving?")
                .default(false)
                .interact()?
        {
            preview_loop(console, &item.id, index).await?;
        }
        if Confirm::new()
            .with_prompt(format!("Approve {approval_id}?"))
            .default(false)
            .interact()?
        {
            let ctrl_c = CtrlC::arm();
            let result = console
                .approve(&item.id, Some(approval_id), ctrl_c.token())
                .await;
            report(console, result);
            printer.flush(console);
        }
        return Ok(());
    }

    if card.proposals().is_empty() {
        return Ok(());
    }
    let mut choices: Vec<String> = card
        .proposals()
        .iter()
        .enumerate()
        .map(|(i, p)| p.label(i))
        .collect();
    choices.push("Skip".into());
    let choice = Select::new()
        .with_prompt("Create an execution from")
        .items(&choices)
        .default(0)
        .interact()?;
    if choice == choices.len() - 1 {
        return Ok(());
    }

    let ctrl_c = CtrlC::arm();
    let result = console.create_execution(&item.id, choice, ctrl_c.token()).await;
    drop(ctrl_c);
    match result {
        Ok(Outcome::Done(_)) => {
            printer.flush(console);
            Box::pin(follow_up(console, printer)).await
        }
        other => {
            report(console, other.map(|outcome| outcome.map(|_| ())));
            Ok(())
        }
    }
}

fn print_help() {
    println!("{}", ui::dim("/retry  resend the last failed command"));
    println!("{}", ui::dim("/quit   leave the console"));
    println!("{}", ui::dim("Ctrl-C cancels the request in flight."));
}

pub async fn run(config: &Config) -> Result<()> {
    let console = Console::from_config(config)?;
    let mut printer = Printer { shown: 0 };
    println!("{}", ui::header("IrisDesk console"));
    print_help();

    loop {
        let input: String = Input::new()
            .with_prompt(ui::accent("›"))
            .allow_empty(true)
            .interact_text()?;
        let text = match input.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                print_help();
                continue;
            }
            "/retry" => match console.retry() {
                Some(draft) => draft,
                None => {
                    println!("{}", ui::dim("nothing to retry"));
                    continue;
                }
            },
            text => text.to_string(),
        };

        let result = {
            let ctrl_c = CtrlC::arm();
            console.submit(&text, ctrl_c.token()).await
        };
        printer.flush(&console);
        match result {
            Ok(Outcome::Done(_)) => follow_up(&console, &mut printer).await?,
            other => report(&console, other.map(|outcome| outcome.map(|_| ()))),
        }
    }
    Ok(())
}
