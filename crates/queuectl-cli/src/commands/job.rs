//! Job command handlers: enqueue, list, get.

use anyhow::{Context as _, Result};
use queuectl_core::domain::{JobId, JobState, NewJob};

use crate::context::Context;
use crate::output;

pub async fn enqueue(ctx: &Context, raw: &str) -> Result<()> {
    let new = NewJob::from_json(raw).context("could not parse job JSON")?;
    let job = ctx.job_queue().await?.enqueue(new).await?;

    if ctx.json {
        output::print_json(&job)
    } else {
        println!("Enqueued job {}", job.id);
        Ok(())
    }
}

pub async fn list(ctx: &Context, state: Option<JobState>) -> Result<()> {
    let jobs = ctx.job_queue().await?.list(state).await?;

    if ctx.json {
        return output::print_json(&jobs);
    }

    let label = state.map_or_else(|| "all".to_string(), |s| s.to_string());
    println!("Jobs ({label}): {}", jobs.len());
    if !jobs.is_empty() {
        output::print_jobs(&jobs);
    }
    Ok(())
}

pub async fn get(ctx: &Context, id: &str) -> Result<()> {
    let job = ctx.job_queue().await?.get(&JobId::new(id)).await?;

    if ctx.json {
        output::print_json(&job)
    } else {
        output::print_job_details(&job);
        Ok(())
    }
}
