//! DLQ command handlers

use anyhow::Result;
use clap::Subcommand;
use queuectl_core::domain::JobId;

use crate::context::Context;
use crate::output;

/// DLQ subcommands
#[derive(Subcommand)]
pub enum DlqCommands {
    /// View jobs that exhausted their retries
    List,
    /// Move a dead job back to pending with attempts reset
    Retry {
        /// Job ID
        id: String,
    },
}

pub async fn handle_dlq_command(command: DlqCommands, ctx: &Context) -> Result<()> {
    let dlq = ctx.dlq().await?;

    match command {
        DlqCommands::List => {
            let jobs = dlq.list().await?;
            if ctx.json {
                return output::print_json(&jobs);
            }
            println!("DLQ Jobs: {}", jobs.len());
            if !jobs.is_empty() {
                output::print_jobs(&jobs);
            }
            Ok(())
        }
        DlqCommands::Retry { id } => {
            let job = dlq.retry(&JobId::new(id)).await?;
            if ctx.json {
                return output::print_json(&job);
            }
            println!("Retried job {} (moved back to pending)", job.id);
            Ok(())
        }
    }
}
