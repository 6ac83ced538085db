//! Supervisor - ワーカープロセスの起動・停止・状態確認
//!
//! Worker records exist for reporting and `stop` only; claiming never reads
//! them, so a stale row is harmless.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::status::StatusReport;
use crate::domain::WorkerRecord;
use crate::error::Result;
use crate::ports::{Clock, ProcessControl, Signalled, Store};

/// Outcome of [`Supervisor::stop`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopReport {
    /// Pids that were sent SIGTERM.
    pub signalled: Vec<u32>,
    /// Recorded pids that no longer exist.
    pub not_running: Vec<u32>,
    /// Pids that could not be signalled, e.g. reused by another user's process.
    pub failed: Vec<StopFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopFailure {
    pub pid: u32,
    pub error: String,
}

pub struct Supervisor {
    store: Arc<dyn Store>,
    process: Arc<dyn ProcessControl>,
    clock: Arc<dyn Clock>,
}

impl Supervisor {
    pub fn new(
        store: Arc<dyn Store>,
        process: Arc<dyn ProcessControl>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            process,
            clock,
        }
    }

    /// Spawn `count` workers and record each one.
    ///
    /// A spawn failure is returned as-is; workers already started keep running.
    pub async fn start(&self, count: usize) -> Result<Vec<WorkerRecord>> {
        self.prune().await?;

        let mut started = Vec::with_capacity(count);
        for _ in 0..count {
            let pid = self.process.spawn_worker()?;
            let record = self.store.record_worker(pid, self.clock.now()).await?;
            info!(pid, record_id = record.id, "worker spawned");
            started.push(record);
        }
        Ok(started)
    }

    /// Ask every recorded worker to drain.
    ///
    /// A pid that cannot be signalled is reported and skipped; the rest are
    /// still signalled.
    pub async fn stop(&self) -> Result<StopReport> {
        let workers = self.store.list_workers().await?;
        Ok(self.signal_all(&workers))
    }

    /// Ask only the given workers to drain.
    pub fn stop_workers(&self, workers: &[WorkerRecord]) -> StopReport {
        self.signal_all(workers)
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let jobs = self.store.count_by_state().await?;
        let active_workers = self
            .store
            .list_workers()
            .await?
            .iter()
            .filter(|w| self.process.is_alive(w.pid))
            .count();
        Ok(StatusReport {
            jobs,
            active_workers,
        })
    }

    fn signal_all(&self, workers: &[WorkerRecord]) -> StopReport {
        let mut report = StopReport::default();
        for worker in workers {
            match self.process.terminate(worker.pid) {
                Ok(Signalled::Delivered) => {
                    info!(pid = worker.pid, "sent SIGTERM to worker");
                    report.signalled.push(worker.pid);
                }
                Ok(Signalled::NotRunning) => {
                    debug!(pid = worker.pid, "worker already gone");
                    report.not_running.push(worker.pid);
                }
                Err(e) => {
                    warn!(pid = worker.pid, error = %e, "could not signal worker");
                    report.failed.push(StopFailure {
                        pid: worker.pid,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Drop records whose process is gone.
    async fn prune(&self) -> Result<()> {
        for worker in self.store.list_workers().await? {
            if !self.process.is_alive(worker.pid) {
                debug!(
                    pid = worker.pid,
                    record_id = worker.id,
                    "pruning dead worker record"
                );
                self.store.remove_worker(worker.id).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use nix::errno::Errno;

    use super::*;
    use crate::domain::{Job, JobId};
    use crate::error::QueueError;
    use crate::ports::{FixedClock, JobStore, WorkerRegistry};
    use crate::queue::InMemoryStore;

    /// Fake process table: pids are handed out sequentially and stay alive
    /// until terminated.
    #[derive(Default)]
    struct FakeProcesses {
        inner: Mutex<FakeInner>,
    }

    #[derive(Default)]
    struct FakeInner {
        next_pid: u32,
        alive: HashSet<u32>,
        foreign: HashSet<u32>,
        fail_spawn_after: Option<usize>,
        spawned: usize,
    }

    impl FakeProcesses {
        fn failing_after(n: usize) -> Self {
            let fake = Self::default();
            fake.inner.lock().unwrap().fail_spawn_after = Some(n);
            fake
        }

        fn kill(&self, pid: u32) {
            self.inner.lock().unwrap().alive.remove(&pid);
        }

        /// The pid now belongs to a process we may not signal.
        fn reuse_by_other_user(&self, pid: u32) {
            let mut inner = self.inner.lock().unwrap();
            inner.alive.remove(&pid);
            inner.foreign.insert(pid);
        }
    }

    impl ProcessControl for FakeProcesses {
        fn spawn_worker(&self) -> Result<u32> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_spawn_after.is_some_and(|n| inner.spawned >= n) {
                return Err(QueueError::WorkerSpawn(std::io::Error::other("fork failed")));
            }
            inner.spawned += 1;
            inner.next_pid += 1;
            let pid = 1000 + inner.next_pid;
            inner.alive.insert(pid);
            Ok(pid)
        }

        fn terminate(&self, pid: u32) -> Result<Signalled> {
            let mut inner = self.inner.lock().unwrap();
            if inner.foreign.contains(&pid) {
                return Err(QueueError::Signal {
                    pid,
                    errno: Errno::EPERM,
                });
            }
            if inner.alive.remove(&pid) {
                Ok(Signalled::Delivered)
            } else {
                Ok(Signalled::NotRunning)
            }
        }

        fn is_alive(&self, pid: u32) -> bool {
            let inner = self.inner.lock().unwrap();
            inner.alive.contains(&pid) || inner.foreign.contains(&pid)
        }
    }

    fn supervisor(processes: Arc<FakeProcesses>) -> (Arc<InMemoryStore>, Supervisor) {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(now));
        let sup = Supervisor::new(store.clone(), processes, clock);
        (store, sup)
    }

    #[tokio::test]
    async fn start_records_every_worker() {
        let processes = Arc::new(FakeProcesses::default());
        let (store, sup) = supervisor(processes.clone());

        let started = sup.start(3).await.unwrap();
        assert_eq!(started.len(), 3);
        assert_eq!(store.list_workers().await.unwrap(), started);
        assert_eq!(sup.status().await.unwrap().active_workers, 3);
    }

    #[tokio::test]
    async fn spawn_failure_keeps_earlier_workers() {
        let processes = Arc::new(FakeProcesses::failing_after(2));
        let (store, sup) = supervisor(processes);

        let err = sup.start(4).await.unwrap_err();
        assert!(matches!(err, QueueError::WorkerSpawn(_)));
        assert_eq!(store.list_workers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stop_ignores_workers_that_already_exited() {
        let processes = Arc::new(FakeProcesses::default());
        let (_store, sup) = supervisor(processes.clone());
        let started = sup.start(2).await.unwrap();
        processes.kill(started[0].pid);

        let report = sup.stop().await.unwrap();
        assert_eq!(report.signalled, vec![started[1].pid]);
        assert_eq!(report.not_running, vec![started[0].pid]);
        assert_eq!(sup.status().await.unwrap().active_workers, 0);
    }

    #[tokio::test]
    async fn stop_keeps_going_past_a_pid_it_cannot_signal() {
        let processes = Arc::new(FakeProcesses::default());
        let (_store, sup) = supervisor(processes.clone());
        let started = sup.start(3).await.unwrap();
        processes.reuse_by_other_user(started[0].pid);

        let report = sup.stop().await.unwrap();
        assert_eq!(report.signalled, vec![started[1].pid, started[2].pid]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].pid, started[0].pid);
        assert!(report.not_running.is_empty());
    }

    #[tokio::test]
    async fn start_prunes_dead_records() {
        let processes = Arc::new(FakeProcesses::default());
        let (store, sup) = supervisor(processes.clone());
        let first = sup.start(1).await.unwrap();
        processes.kill(first[0].pid);

        let second = sup.start(1).await.unwrap();
        assert_eq!(store.list_workers().await.unwrap(), second);
    }

    #[tokio::test]
    async fn status_is_idempotent() {
        let processes = Arc::new(FakeProcesses::default());
        let (store, sup) = supervisor(processes);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        store
            .insert_job(&Job::new(JobId::new("a"), "true".into(), 3, now))
            .await
            .unwrap();
        sup.start(1).await.unwrap();

        let first = sup.status().await.unwrap();
        let second = sup.status().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.jobs.pending, 1);
    }
}
