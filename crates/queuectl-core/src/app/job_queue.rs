//! JobQueue - 投入・参照・設定の管理操作

use std::sync::Arc;

use tracing::info;

use crate::domain::{ConfigKey, Job, JobId, JobState, NewJob, QueueSettings};
use crate::error::{QueueError, Result};
use crate::ports::{Clock, IdGenerator, Store};
use crate::queue::load_settings;

pub struct JobQueue {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl JobQueue {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, clock, ids }
    }

    /// Persist a new `pending` job, eligible immediately.
    ///
    /// Without an explicit `max_retries` the current config value is used.
    pub async fn enqueue(&self, new: NewJob) -> Result<Job> {
        new.validate()?;

        let id = match new.id {
            Some(id) => JobId::new(id),
            None => self.ids.generate_job_id(),
        };
        let max_retries = match new.max_retries {
            Some(n) => n,
            None => load_settings(self.store.as_ref()).await?.max_retries,
        };

        let job = Job::new(id, new.command, max_retries, self.clock.now());
        self.store.insert_job(&job).await?;

        info!(job_id = %job.id, max_retries, command = %job.command, "job enqueued");
        Ok(job)
    }

    pub async fn get(&self, id: &JobId) -> Result<Job> {
        self.store
            .get_job(id)
            .await?
            .ok_or_else(|| QueueError::JobNotFound(id.clone()))
    }

    /// Jobs newest-created first, optionally restricted to one state.
    pub async fn list(&self, state: Option<JobState>) -> Result<Vec<Job>> {
        self.store.list_jobs(state).await
    }

    /// Validate and store an operator setting. Nothing is written on error.
    pub async fn set_config(&self, key: &str, value: &str) -> Result<(ConfigKey, u32)> {
        let key: ConfigKey = key
            .parse()
            .map_err(|_| QueueError::unknown_config_key(key, value))?;
        let parsed = key.parse_value(value)?;

        self.store.set_config(key, &parsed.to_string()).await?;
        info!(key = %key, value = parsed, "config updated");
        Ok((key, parsed))
    }

    /// Effective settings, as the next worker decision would see them.
    pub async fn config_values(&self) -> Result<QueueSettings> {
        load_settings(self.store.as_ref()).await
    }
}
