use thiserror::Error;

use crate::domain::{ConfigKey, JobId};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job id {0} already exists")]
    DuplicateId(JobId),

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("job {0} not in DLQ")]
    NotInDlq(JobId),

    /// Another claimer held the write lock past the store's busy timeout.
    #[error("claim contention: {0}")]
    ClaimContention(String),

    #[error("failed to start command: {0}")]
    ExecutorSpawn(#[source] std::io::Error),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("invalid value {value:?} for config key {key}: {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("failed to spawn worker process: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("failed to signal pid {pid}: {errno}")]
    Signal { pid: u32, errno: nix::errno::Errno },
}

impl QueueError {
    pub fn invalid_config(key: impl Into<String>, value: &str, reason: impl Into<String>) -> Self {
        QueueError::InvalidConfig {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unknown_config_key(key: &str, value: &str) -> Self {
        Self::invalid_config(
            key,
            value,
            format!("unknown key (expected one of: {})", ConfigKey::ALL_NAMES.join(", ")),
        )
    }

    /// Transient errors leave the store untouched and are safe to retry on
    /// the next poll.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueueError::ClaimContention(_) | QueueError::StoreUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
