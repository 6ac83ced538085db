//! Human-readable and JSON rendering.

use anyhow::Result;
use chrono::{DateTime, Utc};
use queuectl_core::app::StatusReport;
use queuectl_core::domain::{ConfigKey, Job, JobState, QueueSettings};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Longest commands are cut so one job stays on one line.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

pub fn print_jobs(jobs: &[Job]) {
    let id_width = jobs
        .iter()
        .map(|j| j.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    println!(
        "{:<id_width$}  {:<10}  {:>8}  {:<19}  {:<19}  COMMAND",
        "ID", "STATE", "ATTEMPTS", "CREATED", "NEXT ATTEMPT"
    );
    for job in jobs {
        println!(
            "{:<id_width$}  {:<10}  {:>8}  {:<19}  {:<19}  {}",
            job.id.as_str(),
            job.state.as_str(),
            format!("{}/{}", job.attempts, job.max_retries),
            timestamp(&job.created_at),
            timestamp(&job.next_attempt_at),
            truncate(&job.command, 60),
        );
    }
}

pub fn print_job_details(job: &Job) {
    println!("Job Details:");
    println!("  ID:           {}", job.id);
    println!("  Command:      {}", job.command);
    println!("  State:        {}", job.state);
    println!("  Attempts:     {} (max retries {})", job.attempts, job.max_retries);
    println!("  Created:      {}", timestamp(&job.created_at));
    println!("  Updated:      {}", timestamp(&job.updated_at));
    if job.state.is_claimable() {
        println!("  Next attempt: {}", timestamp(&job.next_attempt_at));
    }
}

pub fn print_status(report: &StatusReport) {
    println!("Queue Status:");
    for state in JobState::ALL {
        println!("  {:<12} {}", state.as_str(), report.jobs.get(state));
    }
    println!("  {:<12} {}", "total", report.jobs.total());
    println!("Active workers: {}", report.active_workers);
}

pub fn print_settings(settings: &QueueSettings) {
    for key in ConfigKey::ALL {
        println!("{key} = {}", settings.get(key));
    }
}
