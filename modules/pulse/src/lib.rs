//! Pulse: turns the editorial strategy into a queue of timed generation jobs
//! and advances that queue one job per heartbeat.

pub mod descriptor;
pub mod error;
pub mod heartbeat;
pub mod planner;
pub mod policy;
pub mod selector;
pub mod store;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{PulseError, Result};
pub use heartbeat::{Heartbeat, HeartbeatOutcome, HeartbeatReport};
pub use planner::Planner;
pub use traits::{AuditLog, QueueStore, StrategyStore};
