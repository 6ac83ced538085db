//! Domain model (ids, jobs, states, outcomes, decisions, settings).

pub mod decision;
pub mod ids;
pub mod job;
pub mod outcome;
pub mod settings;
pub mod state;
pub mod time;
pub mod worker;

pub use decision::Decision;
pub use ids::JobId;
pub use job::{Job, JobCounts, NewJob};
pub use outcome::{ExecutionReport, Outcome, OutcomeKind};
pub use settings::{ConfigKey, QueueSettings};
pub use state::JobState;
pub use worker::WorkerRecord;
