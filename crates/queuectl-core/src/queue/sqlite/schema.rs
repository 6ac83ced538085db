//! Schema creation and config seeding.

use sqlx::SqlitePool;

use crate::domain::ConfigKey;
use crate::error::{QueueError, Result};

const CREATE_JOBS: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    command TEXT NOT NULL,
    state TEXT NOT NULL DEFAULT 'pending',
    attempts INTEGER NOT NULL DEFAULT 0,
    max_retries INTEGER NOT NULL DEFAULT 3,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    next_attempt_at TEXT NOT NULL
)
"#;

const CREATE_CONFIG: &str = r#"
CREATE TABLE IF NOT EXISTS config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

const CREATE_WORKERS: &str = r#"
CREATE TABLE IF NOT EXISTS workers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pid INTEGER NOT NULL,
    started_at TEXT NOT NULL
)
"#;

/// Idempotent: safe to run from every process that opens the store.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for ddl in [CREATE_JOBS, CREATE_CONFIG, CREATE_WORKERS] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(QueueError::StoreUnavailable)?;
    }

    // Claim query filters on state and orders by next_attempt_at.
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_claim ON jobs(state, next_attempt_at)")
        .execute(pool)
        .await
        .map_err(QueueError::StoreUnavailable)?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at DESC)")
        .execute(pool)
        .await
        .map_err(QueueError::StoreUnavailable)?;

    for key in ConfigKey::ALL {
        sqlx::query("INSERT OR IGNORE INTO config (key, value) VALUES (?, ?)")
            .bind(key.as_str())
            .bind(key.default_value().to_string())
            .execute(pool)
            .await
            .map_err(QueueError::StoreUnavailable)?;
    }

    tracing::debug!("store schema ready");
    Ok(())
}
