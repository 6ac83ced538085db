//! Black-box tests of the `queuectl` binary against a temporary store.

use std::path::Path;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn queuectl(db: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_queuectl"));
    cmd.arg("--db").arg(db).env_remove("QUEUECTL_DB").env("RUST_LOG", "off");
    cmd
}

fn json(db: &Path, args: &[&str]) -> Value {
    let output = queuectl(db).arg("--json").args(args).output().unwrap();
    assert!(
        output.status.success(),
        "queuectl {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn temp_db() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("queue.db");
    (dir, db)
}

#[test]
fn enqueue_then_list() {
    let (_dir, db) = temp_db();

    let out = queuectl(&db)
        .args(["enqueue", r#"{"id":"job1","command":"echo hi","max_retries":2}"#])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "Enqueued job job1");

    let jobs = json(&db, &["list", "--state", "pending"]);
    let jobs = jobs.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], "job1");
    assert_eq!(jobs[0]["state"], "pending");
    assert_eq!(jobs[0]["max_retries"], 2);
    assert_eq!(jobs[0]["attempts"], 0);
}

#[test]
fn duplicate_id_fails() {
    let (_dir, db) = temp_db();
    let job = r#"{"id":"dup","command":"true"}"#;

    queuectl(&db).args(["enqueue", job]).assert().success();
    let out = queuectl(&db).args(["enqueue", job]).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("already exists"));
}

#[test]
fn malformed_job_json_fails() {
    let (_dir, db) = temp_db();
    queuectl(&db).args(["enqueue", "not json"]).assert().failure();
    queuectl(&db).args(["enqueue", r#"{"command":""}"#]).assert().failure();
}

#[test]
fn status_is_stable_between_calls() {
    let (_dir, db) = temp_db();
    queuectl(&db)
        .args(["enqueue", r#"{"command":"true"}"#])
        .assert()
        .success();

    let first = json(&db, &["status"]);
    let second = json(&db, &["status"]);
    assert_eq!(first, second);
    assert_eq!(first["jobs"]["pending"], 1);
    assert_eq!(first["active_workers"], 0);
}

#[test]
fn config_set_validates_keys_and_values() {
    let (_dir, db) = temp_db();

    queuectl(&db).args(["config", "set", "max-retries", "5"]).assert().success();
    queuectl(&db).args(["config", "set", "retries", "5"]).assert().failure();
    queuectl(&db).args(["config", "set", "backoff_base", "-2"]).assert().failure();

    let settings = json(&db, &["config", "list"]);
    assert_eq!(settings["max_retries"], 5);
    assert_eq!(settings["backoff_base"], 2);
}

#[test]
fn dlq_retry_requires_a_dead_job() {
    let (_dir, db) = temp_db();
    queuectl(&db)
        .args(["enqueue", r#"{"id":"live","command":"true"}"#])
        .assert()
        .success();

    let out = queuectl(&db).args(["dlq", "retry", "live"]).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("not in DLQ"));

    let dead = json(&db, &["dlq", "list"]);
    assert_eq!(dead.as_array().unwrap().len(), 0);
}

#[test]
fn detached_workers_process_jobs_and_stop() {
    let (_dir, db) = temp_db();
    queuectl(&db)
        .args(["enqueue", r#"{"id":"ok","command":"echo done"}"#])
        .assert()
        .success();
    queuectl(&db)
        .args(["enqueue", r#"{"id":"bad","command":"exit 1","max_retries":0}"#])
        .assert()
        .success();

    let started = json(&db, &["worker", "start", "--count", "2", "--detach"]);
    assert_eq!(started.as_array().unwrap().len(), 2);

    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        let status = json(&db, &["status"]);
        if status["jobs"]["completed"] == 1 && status["jobs"]["dead"] == 1 {
            break;
        }
        assert!(Instant::now() < deadline, "jobs did not finish: {status}");
        std::thread::sleep(Duration::from_millis(200));
    }

    let report = json(&db, &["worker", "stop"]);
    assert_eq!(report["signalled"].as_array().unwrap().len(), 2);
    assert!(report["failed"].as_array().unwrap().is_empty());

    let deadline = Instant::now() + Duration::from_secs(10);
    while json(&db, &["status"])["active_workers"] != 0 {
        assert!(Instant::now() < deadline, "workers still running after stop");
        std::thread::sleep(Duration::from_millis(200));
    }

    let dead = json(&db, &["dlq", "list"]);
    assert_eq!(dead[0]["id"], "bad");
    assert_eq!(dead[0]["attempts"], 1);
}
