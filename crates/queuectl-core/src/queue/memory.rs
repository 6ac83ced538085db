//! In-memory store implementation.
//!
//! Same semantics as the SQLite store, minus durability. The single mutex
//! plays the role of the SQLite write lock, so `claim_next` is atomic across
//! tasks of one process. Useful for tests and embedding.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{ConfigKey, Job, JobCounts, JobId, JobState, WorkerRecord};
use crate::error::{QueueError, Result};
use crate::ports::{ConfigStore, JobStore, JobUpdate, WorkerRegistry};

struct InMemoryState {
    /// All job records (single source of truth).
    jobs: HashMap<JobId, Job>,

    config: HashMap<ConfigKey, String>,

    workers: Vec<WorkerRecord>,

    next_worker_id: i64,
}

impl InMemoryState {
    fn new() -> Self {
        let config = ConfigKey::ALL
            .into_iter()
            .map(|key| (key, key.default_value().to_string()))
            .collect();
        Self {
            jobs: HashMap::new(),
            config,
            workers: Vec::new(),
            next_worker_id: 1,
        }
    }

    /// Earliest `next_attempt_at` wins; ties broken by creation time, then id.
    fn next_eligible(&self, now: DateTime<Utc>) -> Option<JobId> {
        self.jobs
            .values()
            .filter(|job| job.is_eligible(now))
            .min_by(|a, b| {
                (a.next_attempt_at, a.created_at, &a.id)
                    .cmp(&(b.next_attempt_at, b.created_at, &b.id))
            })
            .map(|job| job.id.clone())
    }
}

pub struct InMemoryStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryState::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.jobs.contains_key(&job.id) {
            return Err(QueueError::DuplicateId(job.id.clone()));
        }
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(id).cloned())
    }

    async fn list_jobs(&self, filter: Option<JobState>) -> Result<Vec<Job>> {
        let state = self.state.lock().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|job| filter.is_none_or(|s| job.state == s))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(jobs)
    }

    async fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<JobId>> {
        let mut state = self.state.lock().await;
        let Some(id) = state.next_eligible(now) else {
            return Ok(None);
        };
        if let Some(job) = state.jobs.get_mut(&id) {
            job.state = JobState::Processing;
            job.updated_at = now;
        }
        Ok(Some(id))
    }

    async fn update_job(
        &self,
        id: &JobId,
        expected: Option<JobState>,
        update: &JobUpdate,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(job) = state.jobs.get_mut(id) else {
            return Ok(false);
        };
        if expected.is_some_and(|s| job.state != s) {
            return Ok(false);
        }
        if let Some(s) = update.state {
            job.state = s;
        }
        if let Some(attempts) = update.attempts {
            job.attempts = attempts;
        }
        if let Some(at) = update.next_attempt_at {
            job.next_attempt_at = at;
        }
        job.updated_at = now;
        Ok(true)
    }

    async fn count_by_state(&self) -> Result<JobCounts> {
        let state = self.state.lock().await;
        let mut counts = JobCounts::default();
        for job in state.jobs.values() {
            counts.add(job.state, 1);
        }
        Ok(counts)
    }
}

#[async_trait]
impl ConfigStore for InMemoryStore {
    async fn get_config(&self, key: ConfigKey) -> Result<Option<String>> {
        let state = self.state.lock().await;
        Ok(state.config.get(&key).cloned())
    }

    async fn set_config(&self, key: ConfigKey, value: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.config.insert(key, value.to_string());
        Ok(())
    }
}

#[async_trait]
impl WorkerRegistry for InMemoryStore {
    async fn record_worker(&self, pid: u32, started_at: DateTime<Utc>) -> Result<WorkerRecord> {
        let mut state = self.state.lock().await;
        let record = WorkerRecord {
            id: state.next_worker_id,
            pid,
            started_at,
        };
        state.next_worker_id += 1;
        state.workers.push(record.clone());
        Ok(record)
    }

    async fn list_workers(&self) -> Result<Vec<WorkerRecord>> {
        let state = self.state.lock().await;
        Ok(state.workers.clone())
    }

    async fn remove_worker(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.workers.retain(|w| w.id != id);
        Ok(())
    }
}
