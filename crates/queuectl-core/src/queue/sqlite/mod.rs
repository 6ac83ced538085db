//! SQLite-backed store.
//!
//! One file shared by every producer, worker and operator process. WAL mode
//! lets readers proceed while a claim holds the write lock; the 5s busy
//! timeout is the contention-retry policy the claim engine relies on.

mod claim;
mod rows;
mod schema;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use self::rows::{JOB_COLUMNS, JobRow, WorkerRow};
use crate::domain::{ConfigKey, Job, JobCounts, JobId, JobState, WorkerRecord, time};
use crate::error::{QueueError, Result};
use crate::ports::{ConfigStore, JobStore, JobUpdate, WorkerRegistry};

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path` and run migrations.
    ///
    /// Failure here is fatal for the calling process.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(BUSY_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(QueueError::StoreUnavailable)?;

        schema::run_migrations(&pool).await?;
        info!(path = %path.display(), "opened job store");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes.
fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

pub(crate) fn claim_error(err: sqlx::Error) -> QueueError {
    if is_busy(&err) {
        QueueError::ClaimContention(err.to_string())
    } else {
        QueueError::StoreUnavailable(err)
    }
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO jobs
                (id, command, state, attempts, max_retries, created_at, updated_at, next_attempt_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id.as_str())
        .bind(&job.command)
        .bind(job.state.as_str())
        .bind(job.attempts as i64)
        .bind(job.max_retries as i64)
        .bind(time::encode(job.created_at))
        .bind(time::encode(job.updated_at))
        .bind(time::encode(job.next_attempt_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(QueueError::DuplicateId(job.id.clone()))
            }
            Err(e) => Err(QueueError::StoreUnavailable(e)),
        }
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?");
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(QueueError::StoreUnavailable)?;

        row.map(Job::try_from).transpose()
    }

    async fn list_jobs(&self, state: Option<JobState>) -> Result<Vec<Job>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
        if let Some(state) = state {
            qb.push(" WHERE state = ").push_bind(state.as_str());
        }
        qb.push(" ORDER BY created_at DESC, id DESC");

        let rows = qb
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(QueueError::StoreUnavailable)?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<JobId>> {
        claim::claim_next(&self.pool, now).await
    }

    async fn update_job(
        &self,
        id: &JobId,
        expected: Option<JobState>,
        update: &JobUpdate,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE jobs SET updated_at = ");
        qb.push_bind(time::encode(now));
        if let Some(state) = update.state {
            qb.push(", state = ").push_bind(state.as_str());
        }
        if let Some(attempts) = update.attempts {
            qb.push(", attempts = ").push_bind(attempts as i64);
        }
        if let Some(at) = update.next_attempt_at {
            qb.push(", next_attempt_at = ").push_bind(time::encode(at));
        }
        qb.push(" WHERE id = ").push_bind(id.as_str());
        if let Some(expected) = expected {
            qb.push(" AND state = ").push_bind(expected.as_str());
        }

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(QueueError::StoreUnavailable)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_state(&self) -> Result<JobCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT state, COUNT(*) FROM jobs GROUP BY state")
                .fetch_all(&self.pool)
                .await
                .map_err(QueueError::StoreUnavailable)?;

        let mut counts = JobCounts::default();
        for (state, n) in rows {
            let state: JobState = state
                .parse()
                .map_err(|e| QueueError::CorruptRecord(format!("{e}")))?;
            counts.add(state, n.max(0) as usize);
        }
        Ok(counts)
    }
}

#[async_trait]
impl ConfigStore for SqliteStore {
    async fn get_config(&self, key: ConfigKey) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT value FROM config WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(QueueError::StoreUnavailable)
    }

    async fn set_config(&self, key: ConfigKey, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO config (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key.as_str())
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(QueueError::StoreUnavailable)?;
        Ok(())
    }
}

#[async_trait]
impl WorkerRegistry for SqliteStore {
    async fn record_worker(&self, pid: u32, started_at: DateTime<Utc>) -> Result<WorkerRecord> {
        let result = sqlx::query("INSERT INTO workers (pid, started_at) VALUES (?, ?)")
            .bind(pid as i64)
            .bind(time::encode(started_at))
            .execute(&self.pool)
            .await
            .map_err(QueueError::StoreUnavailable)?;

        Ok(WorkerRecord {
            id: result.last_insert_rowid(),
            pid,
            started_at,
        })
    }

    async fn list_workers(&self) -> Result<Vec<WorkerRecord>> {
        let rows = sqlx::query_as::<_, WorkerRow>(
            "SELECT id, pid, started_at FROM workers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(QueueError::StoreUnavailable)?;

        rows.into_iter().map(WorkerRecord::try_from).collect()
    }

    async fn remove_worker(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM workers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(QueueError::StoreUnavailable)?;
        Ok(())
    }
}
