//! Ports - 抽象化レイヤー
//!
//! Each trait is a seam to something outside the engine: the durable store,
//! the command runner, OS processes, time and id generation.

pub mod clock;
pub mod executor;
pub mod id_generator;
pub mod process;
pub mod store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::executor::CommandExecutor;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::process::{ProcessControl, Signalled};
pub use self::store::{ConfigStore, JobStore, JobUpdate, Store, WorkerRegistry};
