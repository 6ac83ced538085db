//! Retry policy: decides backoff delays and terminal states.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{Decision, Job, Outcome, QueueSettings};

/// Upper bound on a single backoff delay (about 136 years). Keeps
/// `next_attempt_at` a four-digit year so stored timestamps stay sortable.
pub const MAX_DELAY_SECS: u64 = u32::MAX as u64;

/// Retry policy for failed jobs.
///
/// Built from the settings read at decision time; never reused across
/// decisions, so an operator's `backoff_base` change applies to the very next
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Exponential base (seconds).
    pub backoff_base: u32,
}

impl RetryPolicy {
    pub fn new(backoff_base: u32) -> Self {
        Self { backoff_base }
    }

    pub fn from_settings(settings: &QueueSettings) -> Self {
        Self::new(settings.backoff_base)
    }

    /// Delay before the next attempt: `backoff_base ^ attempt` seconds.
    ///
    /// `attempt` counts from 1 for the attempt that just failed. With base 2:
    /// - attempt 1: 2s
    /// - attempt 2: 4s
    /// - attempt 3: 8s
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = (self.backoff_base as u64)
            .checked_pow(attempt)
            .unwrap_or(MAX_DELAY_SECS)
            .min(MAX_DELAY_SECS);
        Duration::from_secs(secs)
    }

    /// Decide what happens to `job` after an attempt that ended at `now`.
    ///
    /// Pure: no store access, no clock. Only strictly exceeding `max_retries`
    /// dead-letters; `attempts == max_retries` still retries.
    pub fn decide(&self, job: &Job, outcome: &Outcome, now: DateTime<Utc>) -> Decision {
        let attempts = job.attempts.saturating_add(1);

        if outcome.is_success() {
            return Decision::Complete { attempts };
        }

        if attempts > job.max_retries {
            return Decision::MarkDead {
                attempts,
                reason: format!(
                    "max retries exceeded: {attempts} attempts, budget {}",
                    job.max_retries
                ),
            };
        }

        let delay = self.delay(attempts);
        let next_attempt_at = now + chrono::Duration::seconds(delay.as_secs() as i64);
        Decision::Retry {
            attempts,
            delay,
            next_attempt_at,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&QueueSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobId, JobState};
    use chrono::TimeZone;
    use rstest::rstest;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn job(attempts: u32, max_retries: u32) -> Job {
        let mut job = Job::new(JobId::new("j"), "false".into(), max_retries, t0());
        job.state = JobState::Processing;
        job.attempts = attempts;
        job
    }

    #[rstest]
    #[case(2, 1, 2)]
    #[case(2, 2, 4)]
    #[case(2, 3, 8)]
    #[case(3, 2, 9)]
    #[case(1, 5, 1)]
    #[case(0, 1, 0)]
    fn delay_is_base_to_the_attempt(#[case] base: u32, #[case] attempt: u32, #[case] secs: u64) {
        assert_eq!(RetryPolicy::new(base).delay(attempt), Duration::from_secs(secs));
    }

    #[test]
    fn delay_saturates() {
        assert_eq!(
            RetryPolicy::new(10).delay(100),
            Duration::from_secs(MAX_DELAY_SECS)
        );
    }

    #[test]
    fn success_completes_and_counts_the_attempt() {
        let decision = RetryPolicy::default().decide(&job(2, 3), &Outcome::success(), t0());
        assert_eq!(decision, Decision::Complete { attempts: 3 });
    }

    #[test]
    fn failure_within_budget_backs_off() {
        let decision = RetryPolicy::new(2).decide(&job(0, 1), &Outcome::failure("exit 1"), t0());
        assert_eq!(
            decision,
            Decision::Retry {
                attempts: 1,
                delay: Duration::from_secs(2),
                next_attempt_at: t0() + chrono::Duration::seconds(2),
            }
        );
    }

    #[test]
    fn reaching_the_budget_still_retries() {
        let decision = RetryPolicy::new(2).decide(&job(2, 3), &Outcome::failure("x"), t0());
        assert!(matches!(decision, Decision::Retry { attempts: 3, .. }));
    }

    #[test]
    fn exceeding_the_budget_dead_letters() {
        let decision = RetryPolicy::new(2).decide(&job(3, 3), &Outcome::failure("x"), t0());
        assert!(matches!(decision, Decision::MarkDead { attempts: 4, .. }));
    }

    #[test]
    fn zero_budget_dead_letters_on_first_failure() {
        let decision = RetryPolicy::new(2).decide(&job(0, 0), &Outcome::failure("x"), t0());
        assert_eq!(decision.next_state(), JobState::Dead);
    }

    /// Replays a job through the policy, feeding each decision back in.
    fn replay(max_retries: u32, outcomes: &[bool]) -> (JobState, u32) {
        let policy = RetryPolicy::new(2);
        let mut job = job(0, max_retries);
        let mut now = t0();
        for &ok in outcomes {
            let outcome = if ok { Outcome::success() } else { Outcome::failure("x") };
            let decision = policy.decide(&job, &outcome, now);
            job.state = decision.next_state();
            job.attempts = decision.attempts();
            if let Some(at) = decision.next_attempt_at() {
                assert_eq!(at, now + chrono::Duration::seconds(2i64.pow(job.attempts)));
                now = at;
            }
        }
        (job.state, job.attempts)
    }

    #[test]
    fn four_failures_with_three_retries_is_dead() {
        assert_eq!(replay(3, &[false, false, false, false]), (JobState::Dead, 4));
    }

    #[test]
    fn three_failures_then_success_is_completed() {
        assert_eq!(replay(3, &[false, false, false, true]), (JobState::Completed, 4));
    }

    #[test]
    fn attempts_track_consecutive_failures() {
        for n in 1..=5 {
            let (state, attempts) = replay(10, &vec![false; n]);
            assert_eq!(state, JobState::Failed);
            assert_eq!(attempts, n as u32);
        }
    }
}
