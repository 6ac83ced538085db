//! Outcome model: what a single execution attempt produced.
//!
//! Architecture-agnostic: it does not know about stores or workers, only the
//! "shape" of a result that the retry policy can judge and the log can show.

use serde::{Deserialize, Serialize};

/// Placeholder recorded when a command printed nothing.
pub const NO_OUTPUT: &str = "No output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// Captured result of running a command to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,

    /// Combined stdout and stderr, trimmed.
    pub output: String,
}

impl ExecutionReport {
    pub fn new(exit_code: Option<i32>, output: impl Into<String>) -> Self {
        let output = output.into();
        let trimmed = output.trim();
        Self {
            exit_code,
            output: if trimmed.is_empty() {
                NO_OUTPUT.to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// The result of one attempt, as seen by the retry policy.
///
/// A command that could not even be started is a `Failure` with no exit code;
/// the policy treats it exactly like a non-zero exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            kind: OutcomeKind::Success,
            exit_code: Some(0),
            output: None,
            reason: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Failure,
            exit_code: None,
            output: None,
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}

impl From<ExecutionReport> for Outcome {
    fn from(report: ExecutionReport) -> Self {
        if report.succeeded() {
            Self {
                kind: OutcomeKind::Success,
                exit_code: report.exit_code,
                output: Some(report.output),
                reason: None,
            }
        } else {
            let reason = match report.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            Self {
                kind: OutcomeKind::Failure,
                exit_code: report.exit_code,
                output: Some(report.output),
                reason: Some(reason),
            }
        }
    }
}
