//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod config;
mod dlq;
mod job;
mod worker;

pub use config::ConfigCommands;
pub use dlq::DlqCommands;
pub use worker::WorkerCommands;

use anyhow::Result;
use clap::Subcommand;
use queuectl_core::domain::JobState;

use crate::context::Context;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Add a new job to the queue
    Enqueue {
        /// Job JSON, e.g. '{"id":"job1","command":"sleep 2","max_retries":3}'
        job: String,
    },
    /// Worker management
    Worker {
        #[command(subcommand)]
        command: WorkerCommands,
    },
    /// Show job counts per state and active workers
    Status,
    /// List jobs, newest first
    List {
        /// Only jobs in this state
        #[arg(long)]
        state: Option<JobState>,
    },
    /// Show one job
    Get {
        /// Job ID
        id: String,
    },
    /// Dead letter queue
    Dlq {
        #[command(subcommand)]
        command: DlqCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Route a command to its handler module.
pub async fn handle_command(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Enqueue { job } => job::enqueue(ctx, &job).await,
        Commands::Worker { command } => worker::handle_worker_command(command, ctx).await,
        Commands::Status => worker::status(ctx).await,
        Commands::List { state } => job::list(ctx, state).await,
        Commands::Get { id } => job::get(ctx, &id).await,
        Commands::Dlq { command } => dlq::handle_dlq_command(command, ctx).await,
        Commands::Config { command } => config::handle_config_command(command, ctx).await,
    }
}
