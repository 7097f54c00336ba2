use super::cancel::CtrlC;
use super::render::{render_card, render_config, render_item, render_response};
use crate::cli::commands::{Cli, Commands};
use crate::ui::style as ui;
use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use irisdesk::Config;
use irisdesk::normalize::NormalizeOptions;
use irisdesk::orchestrator::{ApprovalOrchestrator, Endpoints, Outcome};
use irisdesk::registry::{PatchSet, ProposedCommand};
use irisdesk::session::Console;
use irisdesk::transport::HttpTransport;
use std::path::Path;
use std::sync::Arc;

fn orchestrator(config: &Config) -> Result<ApprovalOrchestrator> {
    Ok(ApprovalOrchestrator::new(
        Arc::new(HttpTransport::new(&config.backend)),
        Endpoints::from_config(&config.backend)?,
        NormalizeOptions::from(&config.console),
    ))
}

fn print_cancelled() {
    println!("{}", ui::dim("cancelled"));
}

async fn send(config: &Config, text: &str) -> Result<()> {
    let console = Console::from_config(config)?;
    let ctrl_c = CtrlC::arm();
    match console.submit(text, ctrl_c.token()).await? {
        Outcome::Cancelled => print_cancelled(),
        Outcome::Done(report) => {
            for item in console.snapshot().iter().skip(1) {
                println!("{}", render_item(item));
            }
            if report.used_fallback {
                println!("{}", ui::dim("(answered by fallback endpoint)"));
            }
        }
    }
    Ok(())
}

async fn approve(config: &Config, approval_id: &str) -> Result<()> {
    let orchestrator = orchestrator(config)?;
    let ctrl_c = CtrlC::arm();
    match orchestrator
        .approve(approval_id, &PatchSet::new(), ctrl_c.token())
        .await?
    {
        Outcome::Cancelled => print_cancelled(),
        Outcome::Done(receipt) => {
            println!(
                "{} {}",
                ui::success("✓"),
                ui::value(format!("approved {}", receipt.approval_id))
            );
            println!("{}", render_response(&receipt.response));
        }
    }
    Ok(())
}

fn read_proposal(path: &Path) -> Result<ProposedCommand> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read proposal file {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&contents).context("Proposal file is not valid JSON")?;
    ProposedCommand::from_value(&value).context("Proposal file must hold a single JSON object")
}

async fn execute(config: &Config, path: &Path, approve_now: bool) -> Result<()> {
    let proposal = read_proposal(path)?;
    let orchestrator = orchestrator(config)?;

    let ticket = {
        let ctrl_c = CtrlC::arm();
        match orchestrator.create_execution(&proposal, ctrl_c.token()).await? {
            Outcome::Cancelled => {
                print_cancelled();
                return Ok(());
            }
            Outcome::Done(ticket) => ticket,
        }
    };
    let card = ticket.card(&proposal);
    println!("{}", render_card(&card));

    if !approve_now {
        return Ok(());
    }
    let Some(approval_id) = card.approval_id() else {
        bail!("Execution reply carried no approval id; nothing to approve");
    };
    let confirmed = Confirm::new()
        .with_prompt(format!("Approve {approval_id}?"))
        .default(false)
        .interact()?;
    if confirmed {
        approve(config, approval_id).await?;
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Send { text } => send(&config, &text.join(" ")).await,
        Commands::Approve { approval_id } => approve(&config, &approval_id).await,
        Commands::Execute { proposal, approve } => execute(&config, &proposal, approve).await,
        Commands::Chat => super::chat::run(&config).await,
        Commands::Config => {
            println!("{}", render_config(&config)?);
            Ok(())
        }
    }
}
