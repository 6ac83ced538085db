//! Store ports - the durable source of truth.
//!
//! The store exclusively owns jobs, config and worker liveness records;
//! workers hold nothing durable of their own. Implementations must give
//! [`JobStore::claim_next`] serializable read-modify-write semantics across
//! processes: that call is the only mutual-exclusion mechanism in the system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ConfigKey, Job, JobCounts, JobId, JobState, WorkerRecord};
use crate::error::Result;

/// Column changes applied by [`JobStore::update_job`]. `updated_at` is always
/// refreshed; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub state: Option<JobState>,
    pub attempts: Option<u32>,
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn state(state: JobState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_next_attempt_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_attempt_at = Some(at);
        self
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job. Fails with `DuplicateId` if the id exists.
    async fn insert_job(&self, job: &Job) -> Result<()>;

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>>;

    /// All jobs (optionally one state), newest-created first.
    async fn list_jobs(&self, state: Option<JobState>) -> Result<Vec<Job>>;

    /// Atomically pick one eligible job (`pending`/`failed` with
    /// `next_attempt_at <= now`, earliest `next_attempt_at` first) and mark it
    /// `processing`. Two concurrent calls never return the same id.
    async fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<JobId>>;

    /// Apply `update` if the job exists and (when `expected` is set) is
    /// currently in that state. Returns whether a row changed.
    async fn update_job(
        &self,
        id: &JobId,
        expected: Option<JobState>,
        update: &JobUpdate,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    async fn count_by_state(&self) -> Result<JobCounts>;
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Raw stored value, if any.
    async fn get_config(&self, key: ConfigKey) -> Result<Option<String>>;

    async fn set_config(&self, key: ConfigKey, value: &str) -> Result<()>;
}

#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    async fn record_worker(&self, pid: u32, started_at: DateTime<Utc>) -> Result<WorkerRecord>;

    async fn list_workers(&self) -> Result<Vec<WorkerRecord>>;

    async fn remove_worker(&self, id: i64) -> Result<()>;
}

/// Everything the engine needs from one store handle.
pub trait Store: JobStore + ConfigStore + WorkerRegistry {}

impl<T: JobStore + ConfigStore + WorkerRegistry> Store for T {}
