//! Operator-tunable queue settings stored in the `config` table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueueError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: u32 = 2;

/// The two keys the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    /// Retry budget applied to jobs enqueued without their own.
    MaxRetries,
    /// Exponential base for the retry delay (`base ^ attempts` seconds).
    BackoffBase,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 2] = [ConfigKey::MaxRetries, ConfigKey::BackoffBase];
    pub const ALL_NAMES: [&'static str; 2] = ["max_retries", "backoff_base"];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::MaxRetries => "max_retries",
            ConfigKey::BackoffBase => "backoff_base",
        }
    }

    pub fn default_value(self) -> u32 {
        match self {
            ConfigKey::MaxRetries => DEFAULT_MAX_RETRIES,
            ConfigKey::BackoffBase => DEFAULT_BACKOFF_BASE,
        }
    }

    /// Validate a raw operator value for this key.
    pub fn parse_value(self, raw: &str) -> Result<u32, QueueError> {
        raw.trim().parse::<u32>().map_err(|_| {
            QueueError::invalid_config(self.as_str(), raw, "expected a non-negative integer")
        })
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = QueueError;

    /// Accepts `max_retries` as well as the `max-retries` spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "max_retries" => Ok(ConfigKey::MaxRetries),
            "backoff_base" => Ok(ConfigKey::BackoffBase),
            _ => Err(QueueError::unknown_config_key(s, "")),
        }
    }
}

/// Snapshot of the queue settings at one decision point.
///
/// Never cached across decisions: operators change these while workers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub max_retries: u32,
    pub backoff_base: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl QueueSettings {
    pub fn get(&self, key: ConfigKey) -> u32 {
        match key {
            ConfigKey::MaxRetries => self.max_retries,
            ConfigKey::BackoffBase => self.backoff_base,
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: u32) {
        match key {
            ConfigKey::MaxRetries => self.max_retries = value,
            ConfigKey::BackoffBase => self.backoff_base = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("max_retries", ConfigKey::MaxRetries)]
    #[case("max-retries", ConfigKey::MaxRetries)]
    #[case("backoff_base", ConfigKey::BackoffBase)]
    #[case(" backoff-base ", ConfigKey::BackoffBase)]
    fn key_aliases(#[case] raw: &str, #[case] expected: ConfigKey) {
        assert_eq!(raw.parse::<ConfigKey>().unwrap(), expected);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = "poll_interval".parse::<ConfigKey>().unwrap_err();
        assert!(matches!(err, QueueError::InvalidConfig { .. }));
    }

    #[rstest]
    #[case("5", Some(5))]
    #[case(" 0 ", Some(0))]
    #[case("-1", None)]
    #[case("two", None)]
    #[case("1.5", None)]
    fn value_validation(#[case] raw: &str, #[case] expected: Option<u32>) {
        assert_eq!(ConfigKey::BackoffBase.parse_value(raw).ok(), expected);
    }

    #[test]
    fn defaults_match_seeded_config() {
        let settings = QueueSettings::default();
        assert_eq!(settings.get(ConfigKey::MaxRetries), 3);
        assert_eq!(settings.get(ConfigKey::BackoffBase), 2);
    }
}
