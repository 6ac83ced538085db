//! ProcessControl port - spawning and signalling worker processes.

use crate::error::Result;

/// Result of asking a worker to drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signalled {
    Delivered,
    /// The pid no longer exists. Not an error for `worker stop`.
    NotRunning,
}

pub trait ProcessControl: Send + Sync {
    /// Start one detached worker process and return its pid.
    fn spawn_worker(&self) -> Result<u32>;

    /// Send the graceful-termination signal.
    fn terminate(&self, pid: u32) -> Result<Signalled>;

    /// Zero-effect liveness probe.
    fn is_alive(&self, pid: u32) -> bool;
}
