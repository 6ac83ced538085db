//! OS-backed process control for the supervisor.
//!
//! Workers are started by re-executing the current binary with a hidden
//! subcommand and are signalled with `kill(2)`.

use std::path::PathBuf;
use std::process::Stdio;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::process::Command;

use crate::error::{QueueError, Result};
use crate::ports::{ProcessControl, Signalled};

#[derive(Debug, Clone)]
pub struct OsProcessControl {
    program: PathBuf,
    args: Vec<String>,
    /// Inherit the supervisor's stdout/stderr instead of discarding them.
    inherit_output: bool,
}

impl OsProcessControl {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            inherit_output: true,
        }
    }

    /// Detached workers outlive the terminal; their logs go nowhere.
    pub fn detached(mut self) -> Self {
        self.inherit_output = false;
        self
    }

    fn output(&self) -> Stdio {
        if self.inherit_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl ProcessControl for OsProcessControl {
    /// Must be called from within a tokio runtime; the runtime reaps the
    /// child once it exits.
    fn spawn_worker(&self) -> Result<u32> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(self.output())
            .stderr(self.output())
            // Own process group: a Ctrl-C aimed at the supervisor must not
            // reach the workers before the supervisor signals them itself.
            .process_group(0)
            .spawn()
            .map_err(QueueError::WorkerSpawn)?;

        child.id().ok_or_else(|| {
            QueueError::WorkerSpawn(std::io::Error::other("worker exited before reporting a pid"))
        })
    }

    fn terminate(&self, pid: u32) -> Result<Signalled> {
        match kill(to_pid(pid)?, Signal::SIGTERM) {
            Ok(()) => Ok(Signalled::Delivered),
            Err(Errno::ESRCH) => Ok(Signalled::NotRunning),
            Err(errno) => Err(QueueError::Signal { pid, errno }),
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Ok(pid) = to_pid(pid) else {
            return false;
        };
        // EPERM: the process exists but belongs to someone else.
        matches!(kill(pid, None), Ok(()) | Err(Errno::EPERM))
    }
}

fn to_pid(pid: u32) -> Result<Pid> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(Pid::from_raw(raw)),
        _ => Err(QueueError::Signal {
            pid,
            errno: Errno::EINVAL,
        }),
    }
}
