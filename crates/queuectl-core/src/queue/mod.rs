//! Queue module: store implementations, retry policy and settings access.
//!
//! - `sqlite`: the durable store every process shares
//! - `memory`: same semantics without durability, for tests and embedding
//! - `retry`: pure backoff / dead-letter decision
//! - `settings`: reading `max_retries` / `backoff_base` at decision time

mod memory;
mod retry;
mod settings;
mod sqlite;

pub use memory::InMemoryStore;
pub use retry::{MAX_DELAY_SECS, RetryPolicy};
pub use settings::load_settings;
pub use sqlite::{BUSY_TIMEOUT, SqliteStore};
