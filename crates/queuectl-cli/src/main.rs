//! queuectl
//!
//! Command-line interface for the queuectl job queue.

mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use commands::{Commands, WorkerCommands, handle_command};
use context::Context;
use queuectl_core::config::QueueConfig;
use queuectl_core::observability;

#[derive(Parser)]
#[command(name = "queuectl")]
#[command(about = "CLI-based background job queue", long_about = None, version)]
struct Cli {
    /// Path to the SQLite job store
    #[arg(long, global = true, env = "QUEUECTL_DB")]
    db: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Workers narrate every job; one-shot commands only warn.
    let default_filter = match &cli.command {
        Commands::Worker {
            command: WorkerCommands::Run | WorkerCommands::Start { .. },
        } => "info",
        _ => "warn",
    };
    observability::init_tracing(default_filter);

    let mut config = QueueConfig::from_env().context("invalid environment configuration")?;
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    let ctx = Context::new(config, cli.json);
    handle_command(cli.command, &ctx).await
}
