//! CommandExecutor port - runs a job's command.

use async_trait::async_trait;

use crate::domain::ExecutionReport;
use crate::error::Result;

/// Runs an opaque command string to completion.
///
/// A non-zero exit is a successful *execution* (`Ok` with the exit code);
/// `Err(ExecutorSpawn)` means the command never started.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<ExecutionReport>;
}
