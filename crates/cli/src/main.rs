//! Fleetwatch CLI
//!
//! A command-line tool for inspecting and controlling the container fleet
//! through a running fleetwatchd server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::containers;

/// Fleetwatch CLI
#[derive(Parser)]
#[command(name = "fleetwatch")]
#[command(author, version, about = "CLI for the Fleetwatch container dashboard", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via FLEETWATCH_API_URL env var)
    #[arg(long, env = "FLEETWATCH_API_URL", default_value = "http://localhost:4242")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List containers
    Ps,

    /// Show one container in detail
    Inspect {
        /// Container ID
        id: String,
    },

    /// Start a container
    Start {
        /// Container ID
        id: String,
    },

    /// Stop a container
    Stop {
        /// Container ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Ps => {
            containers::list(&client, cli.format).await?;
        }
        Commands::Inspect { id } => {
            containers::inspect(&client, &id, cli.format).await?;
        }
        Commands::Start { id } => {
            containers::start(&client, &id).await?;
        }
        Commands::Stop { id } => {
            containers::stop(&client, &id).await?;
        }
    }

    Ok(())
}
