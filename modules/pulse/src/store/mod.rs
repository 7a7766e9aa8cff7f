//! Postgres-backed stores. Tables are created by the workspace migrations.

mod audit;
mod queue;
mod strategy;

pub use audit::PgAuditLog;
pub use queue::PgQueueStore;
pub use strategy::PgStrategyStore;

use crate::error::PulseError;

fn to_count(value: i32, column: &str) -> Result<u32, PulseError> {
    u32::try_from(value).map_err(|_| PulseError::Corrupt(format!("{column} = {value}")))
}
