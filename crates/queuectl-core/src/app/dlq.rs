//! Dead letter queue operations.

use std::sync::Arc;

use tracing::info;

use crate::domain::{Job, JobId, JobState};
use crate::error::{QueueError, Result};
use crate::ports::{Clock, JobUpdate, Store};

pub struct DeadLetterQueue {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl DeadLetterQueue {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Dead jobs, newest-created first.
    pub async fn list(&self) -> Result<Vec<Job>> {
        self.store.list_jobs(Some(JobState::Dead)).await
    }

    /// Move a dead job back to `pending` with a fresh retry budget.
    ///
    /// The state check and the write are one conditional update, so a job
    /// that is not dead (or does not exist) is never touched.
    pub async fn retry(&self, id: &JobId) -> Result<Job> {
        let now = self.clock.now();
        let update = JobUpdate::state(JobState::Pending)
            .with_attempts(0)
            .with_next_attempt_at(now);

        if !self
            .store
            .update_job(id, Some(JobState::Dead), &update, now)
            .await?
        {
            return Err(QueueError::NotInDlq(id.clone()));
        }

        info!(job_id = %id, "job requeued from DLQ");
        self.store
            .get_job(id)
            .await?
            .ok_or_else(|| QueueError::JobNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::ports::{FixedClock, JobStore};
    use crate::queue::InMemoryStore;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    async fn setup(state: JobState) -> (Arc<InMemoryStore>, Arc<FixedClock>, DeadLetterQueue) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let mut job = Job::new(JobId::new("j"), "false".into(), 3, t0());
        job.state = state;
        job.attempts = 4;
        store.insert_job(&job).await.unwrap();
        let dlq = DeadLetterQueue::new(store.clone(), clock.clone());
        (store, clock, dlq)
    }

    #[tokio::test]
    async fn retry_resets_a_dead_job() {
        let (_store, clock, dlq) = setup(JobState::Dead).await;
        clock.advance(std::time::Duration::from_secs(60));

        let job = dlq.retry(&JobId::new("j")).await.unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.next_attempt_at, t0() + chrono::Duration::seconds(60));
        assert!(dlq.list().await.unwrap().is_empty());
    }

    #[rstest]
    #[case::pending(JobState::Pending)]
    #[case::processing(JobState::Processing)]
    #[case::completed(JobState::Completed)]
    #[case::failed(JobState::Failed)]
    #[tokio::test]
    async fn retry_rejects_jobs_outside_the_dlq(#[case] state: JobState) {
        let (store, _clock, dlq) = setup(state).await;

        let err = dlq.retry(&JobId::new("j")).await.unwrap_err();
        assert!(matches!(err, QueueError::NotInDlq(_)));

        let untouched = store.get_job(&JobId::new("j")).await.unwrap().unwrap();
        assert_eq!(untouched.state, state);
        assert_eq!(untouched.attempts, 4);
    }

    #[tokio::test]
    async fn retry_rejects_unknown_ids() {
        let (_store, _clock, dlq) = setup(JobState::Dead).await;
        assert!(matches!(
            dlq.retry(&JobId::new("ghost")).await,
            Err(QueueError::NotInDlq(_))
        ));
    }

    #[tokio::test]
    async fn list_only_returns_dead_jobs() {
        let (store, _clock, dlq) = setup(JobState::Dead).await;
        store
            .insert_job(&Job::new(JobId::new("alive"), "true".into(), 3, t0()))
            .await
            .unwrap();

        let dead = dlq.list().await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id.as_str(), "j");
    }
}
