//! Ringform orchestrator — CLI driving ring formation, move commits,
//! member drops and status queries against a swarm of drone nodes.

mod client;
mod commands;
mod config;
mod error;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::OrchestratorConfig;

/// Ringform formation orchestrator
#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "ORCHESTRATOR_CONFIG", value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wire the ring links and elect the anchor
    Form,
    /// Commit every drone's staged offset as its motion target
    Commit,
    /// Drop one drone out of the ring
    Drop {
        /// Id of the drone that should leave
        #[arg(long)]
        id: u32,
    },
    /// Query and print every drone's status
    Status,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orchestrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config =
        OrchestratorConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;
    info!(
        ring = ?config.ring,
        anchor = config.anchor,
        "Loaded configuration"
    );

    match cli.command {
        Command::Form => commands::form(&config).await,
        Command::Commit => commands::commit(&config).await,
        Command::Drop { id } => commands::drop_member(&config, id).await,
        Command::Status => commands::status(&config).await,
    }
}
