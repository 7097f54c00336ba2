#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names
)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::FmtSubscriber;

mod app;
mod cli;
mod ui;

use cli::commands::Cli;
use irisdesk::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_init()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.observability.level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    if config.observability.parsed_level().is_none() {
        tracing::warn!(
            "Unknown log level '{}', falling back to info",
            config.observability.log_level
        );
    }

    app::dispatch::dispatch(cli, config).await
}
