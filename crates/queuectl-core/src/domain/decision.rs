//! Decision model: what happens to a job after an attempt.
//!
//! Decisions are computed by [`RetryPolicy`](crate::queue::RetryPolicy) as a
//! pure function and then persisted by the worker loop. Keeping the two apart
//! means the policy can be tested without a store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::state::JobState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The command succeeded.
    Complete { attempts: u32 },

    /// Failed within budget: back off and let the claim engine pick it up again.
    Retry {
        attempts: u32,
        delay: Duration,
        next_attempt_at: DateTime<Utc>,
    },

    /// Failed past the budget: move to the dead letter queue.
    MarkDead { attempts: u32, reason: String },
}

impl Decision {
    pub fn next_state(&self) -> JobState {
        match self {
            Decision::Complete { .. } => JobState::Completed,
            Decision::Retry { .. } => JobState::Failed,
            Decision::MarkDead { .. } => JobState::Dead,
        }
    }

    /// Attempt count to persist with this decision.
    pub fn attempts(&self) -> u32 {
        match self {
            Decision::Complete { attempts }
            | Decision::Retry { attempts, .. }
            | Decision::MarkDead { attempts, .. } => *attempts,
        }
    }

    pub fn next_attempt_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Decision::Retry {
                next_attempt_at, ..
            } => Some(*next_attempt_at),
            _ => None,
        }
    }
}
