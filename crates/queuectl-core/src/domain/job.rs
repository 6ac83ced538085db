//! Job record and enqueue request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::state::JobState;
use crate::error::{QueueError, Result};

/// A persisted unit of deferred command execution.
///
/// The store owns these; workers only ever hold a snapshot read after a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,

    /// Opaque to the engine; handed to the executor as-is.
    pub command: String,

    pub state: JobState,

    /// Completed executions so far. Never bumped by a claim.
    pub attempts: u32,

    /// Failures beyond this many attempts dead-letter the job.
    pub max_retries: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Earliest instant the claim engine may pick this job.
    pub next_attempt_at: DateTime<Utc>,
}

impl Job {
    /// A fresh pending job, eligible immediately.
    pub fn new(id: JobId, command: String, max_retries: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            command,
            state: JobState::Pending,
            attempts: 0,
            max_retries,
            created_at: now,
            updated_at: now,
            next_attempt_at: now,
        }
    }

    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.state.is_claimable() && self.next_attempt_at <= now
    }
}

/// Producer-facing enqueue request.
///
/// Matches the JSON document accepted on the command line:
/// `{"id": "job1", "command": "sleep 2", "max_retries": 3}` where only
/// `command` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl NewJob {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let job: NewJob =
            serde_json::from_str(raw).map_err(|e| QueueError::InvalidJob(e.to_string()))?;
        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(QueueError::InvalidJob("command cannot be empty".to_string()));
        }
        if let Some(id) = &self.id
            && id.trim().is_empty()
        {
            return Err(QueueError::InvalidJob("id cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Job counts per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub dead: usize,
}

impl JobCounts {
    pub fn get(&self, state: JobState) -> usize {
        match state {
            JobState::Pending => self.pending,
            JobState::Processing => self.processing,
            JobState::Completed => self.completed,
            JobState::Failed => self.failed,
            JobState::Dead => self.dead,
        }
    }

    pub fn add(&mut self, state: JobState, n: usize) {
        match state {
            JobState::Pending => self.pending += n,
            JobState::Processing => self.processing += n,
            JobState::Completed => self.completed += n,
            JobState::Failed => self.failed += n,
            JobState::Dead => self.dead += n,
        }
    }

    pub fn total(&self) -> usize {
        JobState::ALL.into_iter().map(|s| self.get(s)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_job_is_pending_and_immediately_eligible() {
        let job = Job::new(JobId::new("a"), "true".into(), 3, t0());
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.next_attempt_at, t0());
        assert!(job.is_eligible(t0()));
    }

    #[rstest]
    #[case::future_retry(JobState::Failed, 10, false)]
    #[case::due_retry(JobState::Failed, 0, true)]
    #[case::processing(JobState::Processing, 0, false)]
    #[case::dead(JobState::Dead, 0, false)]
    fn eligibility(#[case] state: JobState, #[case] delay_secs: i64, #[case] expected: bool) {
        let mut job = Job::new(JobId::new("a"), "true".into(), 3, t0());
        job.state = state;
        job.next_attempt_at = t0() + chrono::Duration::seconds(delay_secs);
        assert_eq!(job.is_eligible(t0()), expected);
    }

    #[test]
    fn new_job_from_json() {
        let raw = r#"{"id":"job1","command":"echo hi","max_retries":2}"#;
        let job = NewJob::from_json(raw).unwrap();
        assert_eq!(job, NewJob::new("echo hi").with_id("job1").with_max_retries(2));

        let minimal = NewJob::from_json(r#"{"command":"ls"}"#).unwrap();
        assert_eq!(minimal.id, None);
        assert_eq!(minimal.max_retries, None);
    }

    #[rstest]
    #[case::not_json("echo hi")]
    #[case::missing_command(r#"{"id":"x"}"#)]
    #[case::blank_command(r#"{"command":"   "}"#)]
    #[case::blank_id(r#"{"id":"","command":"ls"}"#)]
    #[case::negative_retries(r#"{"command":"ls","max_retries":-1}"#)]
    fn rejects_bad_requests(#[case] raw: &str) {
        assert!(matches!(NewJob::from_json(raw), Err(QueueError::InvalidJob(_))));
    }

    #[test]
    fn counts_total() {
        let mut counts = JobCounts::default();
        counts.add(JobState::Pending, 2);
        counts.add(JobState::Dead, 1);
        assert_eq!(counts.get(JobState::Pending), 2);
        assert_eq!(counts.total(), 3);
    }
}
