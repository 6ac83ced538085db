//! Row types and conversions between SQLite columns and domain types.

use crate::domain::{Job, JobId, JobState, WorkerRecord, time};
use crate::error::{QueueError, Result};

pub const JOB_COLUMNS: &str =
    "id, command, state, attempts, max_retries, created_at, updated_at, next_attempt_at";

#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
    pub id: String,
    pub command: String,
    pub state: String,
    pub attempts: i64,
    pub max_retries: i64,
    pub created_at: String,
    pub updated_at: String,
    pub next_attempt_at: String,
}

impl TryFrom<JobRow> for Job {
    type Error = QueueError;

    fn try_from(row: JobRow) -> Result<Self> {
        let state: JobState = row
            .state
            .parse()
            .map_err(|e| QueueError::CorruptRecord(format!("job {}: {e}", row.id)))?;
        Ok(Job {
            command: row.command,
            state,
            attempts: to_u32(row.attempts, "attempts", &row.id)?,
            max_retries: to_u32(row.max_retries, "max_retries", &row.id)?,
            created_at: time::decode(&row.created_at)?,
            updated_at: time::decode(&row.updated_at)?,
            next_attempt_at: time::decode(&row.next_attempt_at)?,
            id: JobId::new(row.id),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct WorkerRow {
    pub id: i64,
    pub pid: i64,
    pub started_at: String,
}

impl TryFrom<WorkerRow> for WorkerRecord {
    type Error = QueueError;

    fn try_from(row: WorkerRow) -> Result<Self> {
        let pid = u32::try_from(row.pid).map_err(|_| {
            QueueError::CorruptRecord(format!("worker {}: bad pid {}", row.id, row.pid))
        })?;
        Ok(WorkerRecord {
            id: row.id,
            pid,
            started_at: time::decode(&row.started_at)?,
        })
    }
}

fn to_u32(value: i64, column: &str, id: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        QueueError::CorruptRecord(format!("job {id}: {column} out of range ({value})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state: &str, attempts: i64) -> JobRow {
        JobRow {
            id: "j1".into(),
            command: "echo".into(),
            state: state.into(),
            attempts,
            max_retries: 3,
            created_at: "2024-01-01T12:00:00.000Z".into(),
            updated_at: "2024-01-01T12:00:00.000Z".into(),
            next_attempt_at: "2024-01-01T12:00:02.000Z".into(),
        }
    }

    #[test]
    fn converts_valid_row() {
        let job = Job::try_from(row("failed", 1)).unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.attempts, 1);
        assert_eq!(job.next_attempt_at - job.created_at, chrono::Duration::seconds(2));
    }

    #[test]
    fn rejects_unknown_state() {
        assert!(matches!(
            Job::try_from(row("running", 0)),
            Err(QueueError::CorruptRecord(_))
        ));
    }

    #[test]
    fn rejects_negative_attempts() {
        assert!(matches!(
            Job::try_from(row("pending", -1)),
            Err(QueueError::CorruptRecord(_))
        ));
    }
}
