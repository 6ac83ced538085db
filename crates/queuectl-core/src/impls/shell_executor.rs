//! ShellExecutor - `sh -c` でコマンドを実行
//!
//! stdout then stderr, concatenated and trimmed. No timeout: a hung command
//! keeps its worker busy until it exits.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::ExecutionReport;
use crate::error::{QueueError, Result};
use crate::ports::CommandExecutor;

#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str) -> Result<ExecutionReport> {
        tracing::debug!(shell = %self.shell, command, "spawning command");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(QueueError::ExecutorSpawn)?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ExecutionReport::new(output.status.code(), combined))
    }
}
