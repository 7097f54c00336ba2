use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `IrisDesk` - operator console for a command/approval backend.
#[derive(Parser, Debug)]
#[command(name = "irisdesk")]
#[command(version = "0.1.0")]
#[command(about = "Submit commands, review proposals and approve executions.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit one command and print the reply
    Send {
        /// Command text (joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Approve an execution by its approval id
    Approve {
        /// Approval id returned when the execution was created
        approval_id: String,
    },

    /// Create an execution from a proposal saved as JSON
    Execute {
        /// File holding exactly one proposed command object
        proposal: PathBuf,

        /// Ask to approve the new execution right away
        #[arg(long)]
        approve: bool,
    },

    /// Interactive console: submit, select, preview and approve
    Chat,

    /// Show the resolved configuration and endpoints
    Config,
}
