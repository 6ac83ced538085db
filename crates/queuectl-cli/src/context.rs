//! Per-invocation context shared by every command handler.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use queuectl_core::app::{DeadLetterQueue, JobQueue};
use queuectl_core::config::QueueConfig;
use queuectl_core::ports::{Clock, SystemClock, UlidGenerator};
use queuectl_core::queue::SqliteStore;

#[derive(Debug, Clone)]
pub struct Context {
    pub config: QueueConfig,

    /// Emit JSON instead of human-readable output
    pub json: bool,
}

impl Context {
    pub fn new(config: QueueConfig, json: bool) -> Self {
        Self { config, json }
    }

    /// Open the store. Failure here ends the command.
    pub async fn open_store(&self) -> Result<Arc<SqliteStore>> {
        let path = &self.config.db_path;
        let store = SqliteStore::open(path)
            .await
            .with_context(|| format!("failed to open job store at {}", path.display()))?;
        Ok(Arc::new(store))
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(SystemClock)
    }

    pub async fn job_queue(&self) -> Result<JobQueue> {
        let store = self.open_store().await?;
        let clock = self.clock();
        let ids = Arc::new(UlidGenerator::new(clock.clone()));
        Ok(JobQueue::new(store, clock, ids))
    }

    pub async fn dlq(&self) -> Result<DeadLetterQueue> {
        Ok(DeadLetterQueue::new(self.open_store().await?, self.clock()))
    }
}
