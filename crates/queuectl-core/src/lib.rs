//! queuectl-core
//!
//! Durable, multi-process job queue for shell commands.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, job, state, outcome, decision, settings）
//! - **ports**: 抽象化レイヤー（Store, CommandExecutor, ProcessControl, Clock, IdGenerator）
//! - **queue**: SQLite / in-memory store、claim、retry policy
//! - **impls**: ports の OS 実装（ShellExecutor, OsProcessControl）
//! - **app**: アプリケーションロジック（JobQueue, WorkerLoop, Supervisor, DeadLetterQueue）

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod shutdown;

pub use error::{QueueError, Result};
