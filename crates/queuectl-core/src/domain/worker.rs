//! Worker liveness records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One spawned worker process, as recorded by the supervisor.
///
/// Used for status reporting and `worker stop` only. Claiming never looks at
/// this table, so a stale or missing row cannot affect correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: i64,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}
