//! Timestamp encoding for the store.
//!
//! Every timestamp is written as fixed-width RFC 3339 in UTC with millisecond
//! precision (`2024-01-01T12:00:00.000Z`). Fixed width keeps string order and
//! time order identical, which the claim query relies on for
//! `next_attempt_at <= now`.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{QueueError, Result};

pub fn encode(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| QueueError::CorruptRecord(format!("bad timestamp {raw:?}: {e}")))
}

/// Drop sub-millisecond precision so an in-memory value equals its stored form.
pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
    use chrono::DurationRound;
    ts.duration_trunc(chrono::Duration::milliseconds(1))
        .unwrap_or(ts)
}
