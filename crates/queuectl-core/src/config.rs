//! Process configuration.
//!
//! Queue behaviour (`max_retries`, `backoff_base`) lives in the store's config
//! table and is read at decision time. What is here only shapes one process:
//! where the store is and how the worker loop paces itself.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{QueueError, Result};

pub const DEFAULT_DB_PATH: &str = "queue.db";

/// Worker loop pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Sleep when no job is eligible.
    pub poll_interval: Duration,

    /// Sleep after an unexpected loop error.
    pub error_backoff: Duration,

    /// How long an in-flight command may keep running after a shutdown request.
    pub shutdown_grace: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub db_path: PathBuf,
    pub worker: WorkerSettings,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            worker: WorkerSettings::default(),
        }
    }
}

impl QueueConfig {
    /// Reads configuration from environment variables
    ///
    /// - QUEUECTL_DB (optional, default: ./queue.db)
    /// - QUEUECTL_POLL_INTERVAL_MS (optional, default: 1000)
    /// - QUEUECTL_ERROR_BACKOFF_MS (optional, default: 5000)
    /// - QUEUECTL_SHUTDOWN_GRACE_MS (optional, default: 2000)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let db_path = lookup("QUEUECTL_DB")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let worker = WorkerSettings {
            poll_interval: millis(
                &lookup,
                "QUEUECTL_POLL_INTERVAL_MS",
                defaults.worker.poll_interval,
            )?,
            error_backoff: millis(
                &lookup,
                "QUEUECTL_ERROR_BACKOFF_MS",
                defaults.worker.error_backoff,
            )?,
            shutdown_grace: millis(
                &lookup,
                "QUEUECTL_SHUTDOWN_GRACE_MS",
                defaults.worker.shutdown_grace,
            )?,
        };

        let config = Self { db_path, worker };
        config.validate()?;
        Ok(config)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker.poll_interval.is_zero() {
            return Err(QueueError::invalid_config(
                "QUEUECTL_POLL_INTERVAL_MS",
                "0",
                "must be greater than zero",
            ));
        }
        if self.worker.error_backoff.is_zero() {
            return Err(QueueError::invalid_config(
                "QUEUECTL_ERROR_BACKOFF_MS",
                "0",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| QueueError::invalid_config(key, &raw, e.to_string())),
    }
}
