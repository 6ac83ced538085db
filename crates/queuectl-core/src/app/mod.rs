//! App - アプリケーション層
//!
//! ports を組み合わせて queuectl の操作を実装します。
//!
//! # 主要コンポーネント
//! - **JobQueue**: 投入・参照・設定
//! - **WorkerLoop**: claim → execute → decide → persist
//! - **Supervisor**: ワーカープロセスの起動・停止・状態
//! - **DeadLetterQueue**: DLQ の一覧と再投入

pub mod dlq;
pub mod job_queue;
pub mod status;
pub mod supervisor;
pub mod worker_loop;

pub use self::dlq::DeadLetterQueue;
pub use self::job_queue::JobQueue;
pub use self::status::StatusReport;
pub use self::supervisor::{StopFailure, StopReport, Supervisor};
pub use self::worker_loop::{Tick, WorkerExit, WorkerLoop};
