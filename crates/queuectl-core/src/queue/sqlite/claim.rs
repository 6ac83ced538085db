//! Claim engine: the atomic "acquire next eligible job" transaction.
//!
//! `BEGIN IMMEDIATE` takes SQLite's reserved (write) lock up front, so at most
//! one claimer across all processes is between its SELECT and its UPDATE at
//! any time. A competing claimer blocks in the busy handler (bounded by the
//! connection's `busy_timeout`) and then reads the already-updated row. The
//! transaction commits before the command runs; nothing holds a lock during
//! execution.

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use super::claim_error;
use crate::domain::{JobId, JobState, time};
use crate::error::Result;

const SELECT_ELIGIBLE: &str = r#"
SELECT id FROM jobs
WHERE state IN (?, ?) AND next_attempt_at <= ?
ORDER BY next_attempt_at ASC, created_at ASC, id ASC
LIMIT 1
"#;

pub async fn claim_next(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Option<JobId>> {
    let mut conn = pool.acquire().await.map_err(claim_error)?;

    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *conn)
        .await
        .map_err(claim_error)?;

    match select_and_mark(&mut conn, now).await {
        Ok(Some(id)) => match sqlx::query("COMMIT").execute(&mut *conn).await {
            Ok(_) => {
                debug!(job_id = %id, "claimed job");
                Ok(Some(id))
            }
            Err(e) => {
                rollback(conn).await;
                Err(claim_error(e))
            }
        },
        Ok(None) => {
            rollback(conn).await;
            Ok(None)
        }
        Err(e) => {
            rollback(conn).await;
            Err(e)
        }
    }
}

async fn select_and_mark(conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<Option<JobId>> {
    let now = time::encode(now);

    let id: Option<String> = sqlx::query_scalar(SELECT_ELIGIBLE)
        .bind(JobState::Pending.as_str())
        .bind(JobState::Failed.as_str())
        .bind(&now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(claim_error)?;

    let Some(id) = id else {
        return Ok(None);
    };

    sqlx::query("UPDATE jobs SET state = ?, updated_at = ? WHERE id = ?")
        .bind(JobState::Processing.as_str())
        .bind(&now)
        .bind(&id)
        .execute(&mut *conn)
        .await
        .map_err(claim_error)?;

    Ok(Some(JobId::new(id)))
}

/// Roll back; if even that fails, drop the connection instead of returning a
/// connection with an open transaction to the pool.
async fn rollback(mut conn: PoolConnection<Sqlite>) {
    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        warn!(error = %e, "rollback failed, discarding connection");
        drop(conn.detach());
    }
}
