//! Worker command handlers
//!
//! `start` and `stop` run in the operator's shell; `run` is the hidden entry
//! point each spawned worker process executes.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use queuectl_core::app::{StopReport, Supervisor, WorkerExit, WorkerLoop};
use queuectl_core::impls::{OsProcessControl, ShellExecutor};
use queuectl_core::shutdown::{self, Shutdown};
use tracing::info;

use crate::context::Context;
use crate::output;

/// Worker subcommands
#[derive(Subcommand)]
pub enum WorkerCommands {
    /// Start one or more workers
    Start {
        /// Number of workers
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Return immediately instead of waiting for Ctrl-C
        #[arg(long)]
        detach: bool,
    },
    /// Stop running workers gracefully
    Stop,
    /// Run a worker loop in this process
    #[command(hide = true)]
    Run,
}

pub async fn handle_worker_command(command: WorkerCommands, ctx: &Context) -> Result<()> {
    match command {
        WorkerCommands::Start { count, detach } => start(ctx, count, detach).await,
        WorkerCommands::Stop => stop(ctx).await,
        WorkerCommands::Run => run(ctx).await,
    }
}

fn supervisor(
    ctx: &Context,
    store: Arc<queuectl_core::queue::SqliteStore>,
    detach: bool,
) -> Result<Supervisor> {
    let exe = std::env::current_exe().context("cannot locate the queuectl executable")?;
    let args = vec![
        "--db".to_string(),
        ctx.config.db_path.display().to_string(),
        "worker".to_string(),
        "run".to_string(),
    ];
    let mut process = OsProcessControl::new(exe, args);
    if detach {
        process = process.detached();
    }
    Ok(Supervisor::new(store, Arc::new(process), ctx.clock()))
}

async fn start(ctx: &Context, count: usize, detach: bool) -> Result<()> {
    let store = ctx.open_store().await?;
    let supervisor = supervisor(ctx, store, detach)?;

    let started = supervisor.start(count).await?;
    let pids: Vec<u32> = started.iter().map(|w| w.pid).collect();

    if ctx.json {
        output::print_json(&started)?;
    } else {
        let list: Vec<String> = pids.iter().map(u32::to_string).collect();
        println!("Started {} workers with PIDs: {}", pids.len(), list.join(", "));
    }

    if detach {
        return Ok(());
    }

    let shutdown = Shutdown::new();
    shutdown::install_signal_handler(shutdown.clone()).context("failed to install signal handler")?;
    shutdown.cancelled().await;

    if !ctx.json {
        println!("\nStopping workers...");
    }
    let report = supervisor.stop_workers(&started);
    print_stop_report(ctx, &report)
}

async fn stop(ctx: &Context) -> Result<()> {
    let store = ctx.open_store().await?;
    let report = supervisor(ctx, store, true)?.stop().await?;
    print_stop_report(ctx, &report)
}

pub async fn status(ctx: &Context) -> Result<()> {
    let store = ctx.open_store().await?;
    let report = supervisor(ctx, store, true)?.status().await?;

    if ctx.json {
        output::print_json(&report)
    } else {
        output::print_status(&report);
        Ok(())
    }
}

async fn run(ctx: &Context) -> Result<()> {
    let store = ctx.open_store().await?;
    let shutdown = Shutdown::new();
    shutdown::install_signal_handler(shutdown.clone()).context("failed to install signal handler")?;

    let worker = WorkerLoop::new(
        store.clone(),
        Arc::new(ShellExecutor::new()),
        ctx.clock(),
        ctx.config.worker,
    );

    match worker.run(&shutdown).await {
        WorkerExit::Drained => info!(worker = %worker.name(), "worker stopped"),
        WorkerExit::GraceExpired { job_id } => {
            info!(worker = %worker.name(), job_id = %job_id, "worker force-exited")
        }
    }

    store.close().await;
    Ok(())
}

fn print_stop_report(ctx: &Context, report: &StopReport) -> Result<()> {
    if ctx.json {
        return output::print_json(report);
    }
    println!("Sent stop signal to {} worker(s)", report.signalled.len());
    if !report.not_running.is_empty() {
        println!("{} recorded worker(s) were already gone", report.not_running.len());
    }
    for failure in &report.failed {
        eprintln!("Could not stop worker {}: {}", failure.pid, failure.error);
    }
    Ok(())
}
