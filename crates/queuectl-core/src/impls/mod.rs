//! Impls - ports の実装
//!
//! - **ShellExecutor**: `sh -c` でジョブのコマンドを実行
//! - **OsProcessControl**: ワーカープロセスの起動と停止（nix / kill(2)）
//!
//! Store implementations live in [`crate::queue`].

pub mod os_process;
pub mod shell_executor;

pub use self::os_process::OsProcessControl;
pub use self::shell_executor::ShellExecutor;
