//! WorkerLoop - ジョブ実行ループ
//!
//! # フロー
//! 1. claim_next() で eligible な job を1件確保（state: processing）
//! 2. job を取得して CommandExecutor で実行 → Outcome
//! 3. config から settings を読み直し、RetryPolicy で Decision
//! 4. Decision を store に反映（completed / failed + backoff / dead）
//!
//! One loop per process, strictly sequential. Cross-process exclusion comes
//! entirely from the store's claim transaction.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::WorkerSettings;
use crate::domain::{Decision, Job, JobId, JobState, Outcome, QueueSettings};
use crate::error::{QueueError, Result};
use crate::ports::{Clock, CommandExecutor, JobUpdate, Store};
use crate::queue::{RetryPolicy, load_settings};
use crate::shutdown::Shutdown;

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tick", rename_all = "snake_case")]
pub enum Tick {
    /// Nothing eligible right now.
    Idle,

    /// A job ran to completion and its decision was persisted.
    Processed { job_id: JobId, decision: Decision },

    /// Shutdown grace expired while the command was still running. The job
    /// stays `processing`; nothing reclaims it.
    Abandoned { job_id: JobId },
}

/// Why [`WorkerLoop::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Shutdown observed between jobs.
    Drained,

    /// Shutdown grace expired mid-command.
    GraceExpired { job_id: JobId },
}

pub struct WorkerLoop {
    store: Arc<dyn Store>,
    executor: Arc<dyn CommandExecutor>,
    clock: Arc<dyn Clock>,
    settings: WorkerSettings,
    name: String,
}

impl WorkerLoop {
    pub fn new(
        store: Arc<dyn Store>,
        executor: Arc<dyn CommandExecutor>,
        clock: Arc<dyn Clock>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            store,
            executor,
            clock,
            settings,
            name: format!("worker-{}", std::process::id()),
        }
    }

    /// Label used in every log line from this loop.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Poll until shutdown. Never returns on transient errors.
    pub async fn run(&self, shutdown: &Shutdown) -> WorkerExit {
        info!(worker = %self.name, "worker started, polling");

        loop {
            // Checked only between jobs, so nothing is in flight here.
            if shutdown.is_requested() {
                info!(worker = %self.name, "shutdown requested, exiting");
                return WorkerExit::Drained;
            }

            match self.run_once(shutdown).await {
                Ok(Tick::Idle) => self.idle(self.settings.poll_interval, shutdown).await,
                Ok(Tick::Processed { .. }) => {}
                Ok(Tick::Abandoned { job_id }) => {
                    warn!(
                        worker = %self.name,
                        job_id = %job_id,
                        grace_ms = self.settings.shutdown_grace.as_millis() as u64,
                        "shutdown grace expired mid-command, job left in processing"
                    );
                    return WorkerExit::GraceExpired { job_id };
                }
                Err(QueueError::ClaimContention(reason)) => {
                    debug!(worker = %self.name, %reason, "claim contended, retrying next poll");
                    self.idle(self.settings.poll_interval, shutdown).await;
                }
                Err(e) => {
                    error!(
                        worker = %self.name,
                        error = %e,
                        backoff_ms = self.settings.error_backoff.as_millis() as u64,
                        "worker loop error, backing off"
                    );
                    self.idle(self.settings.error_backoff, shutdown).await;
                }
            }
        }
    }

    /// One claim → execute → decide → persist cycle.
    pub async fn run_once(&self, shutdown: &Shutdown) -> Result<Tick> {
        let Some(job_id) = self.store.claim_next(self.clock.now()).await? else {
            return Ok(Tick::Idle);
        };

        // A read failure here leaves the job in processing, like a failed persist.
        let Some(job) = self.store.get_job(&job_id).await? else {
            warn!(worker = %self.name, job_id = %job_id, "claimed job vanished, skipping");
            return Ok(Tick::Idle);
        };

        if shutdown.is_requested() {
            info!(
                worker = %self.name,
                job_id = %job.id,
                "shutdown requested during claim, running the claimed job first"
            );
        }

        info!(
            worker = %self.name,
            job_id = %job.id,
            attempts = job.attempts,
            max_retries = job.max_retries,
            command = %job.command,
            "executing job"
        );

        let Some(outcome) = self.execute(&job, shutdown).await else {
            return Ok(Tick::Abandoned { job_id });
        };

        let decision = self.decide(&job, &outcome).await;
        self.persist(&job, &decision).await?;

        Ok(Tick::Processed { job_id, decision })
    }

    /// Run the command, racing it against the shutdown grace deadline.
    ///
    /// The grace period never starts before the command does.
    async fn execute(&self, job: &Job, shutdown: &Shutdown) -> Option<Outcome> {
        let started = Instant::now();
        let run = self.executor.execute(&job.command);

        tokio::select! {
            result = run => Some(match result {
                Ok(report) => {
                    debug!(
                        worker = %self.name,
                        job_id = %job.id,
                        exit_code = ?report.exit_code,
                        output = %report.output,
                        "command finished"
                    );
                    Outcome::from(report)
                }
                Err(e) => {
                    warn!(
                        worker = %self.name,
                        job_id = %job.id,
                        error = %e,
                        "command failed to start"
                    );
                    Outcome::failure(e.to_string())
                }
            }),
            _ = shutdown.grace_elapsed(started, self.settings.shutdown_grace) => None,
        }
    }

    async fn decide(&self, job: &Job, outcome: &Outcome) -> Decision {
        // Read fresh: an operator may have changed backoff_base since the claim.
        let settings = match load_settings(self.store.as_ref()).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    worker = %self.name,
                    job_id = %job.id,
                    error = %e,
                    "could not read queue settings, using defaults"
                );
                QueueSettings::default()
            }
        };
        RetryPolicy::from_settings(&settings).decide(job, outcome, self.clock.now())
    }

    async fn persist(&self, job: &Job, decision: &Decision) -> Result<()> {
        let mut update =
            JobUpdate::state(decision.next_state()).with_attempts(decision.attempts());
        if let Some(at) = decision.next_attempt_at() {
            update = update.with_next_attempt_at(at);
        }

        let applied = self
            .store
            .update_job(&job.id, Some(JobState::Processing), &update, self.clock.now())
            .await?;
        if !applied {
            warn!(
                worker = %self.name,
                job_id = %job.id,
                "job left processing before its result was recorded"
            );
            return Ok(());
        }

        match decision {
            Decision::Complete { attempts } => {
                info!(worker = %self.name, job_id = %job.id, attempts, "job completed");
            }
            Decision::Retry {
                attempts,
                delay,
                next_attempt_at,
            } => {
                info!(
                    worker = %self.name,
                    job_id = %job.id,
                    attempts,
                    delay_secs = delay.as_secs(),
                    next_attempt_at = %next_attempt_at,
                    "job failed, retry scheduled"
                );
            }
            Decision::MarkDead { attempts, reason } => {
                warn!(
                    worker = %self.name,
                    job_id = %job.id,
                    attempts,
                    %reason,
                    "job moved to DLQ"
                );
            }
        }
        Ok(())
    }

    async fn idle(&self, duration: Duration, shutdown: &Shutdown) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = shutdown.cancelled() => {}
        }
    }
}
