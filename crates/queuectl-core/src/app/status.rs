//! Status - ジョブ件数とワーカー数のスナップショット

use serde::{Deserialize, Serialize};

use crate::domain::JobCounts;

/// Counts per state plus the number of recorded workers whose pid still
/// answers a liveness probe. Read-only: taking a status changes nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub jobs: JobCounts,
    pub active_workers: usize,
}
