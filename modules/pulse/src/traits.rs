// Storage seams for the planner and heartbeat. Postgres implementations live
// in `store`, in-memory ones in `testing`. Only the queue claim needs
// transactional discipline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use newsroom_common::{
    EditorialStrategy, ExecutionLogEntry, JobPatch, NewJob, NewLogEntry, QueueJob,
};

use crate::error::Result;

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append jobs in one operation, assigning ids.
    async fn enqueue(&self, jobs: Vec<NewJob>) -> Result<Vec<QueueJob>>;

    /// PENDING jobs with `scheduled_at <= now`, earliest first.
    async fn list_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueueJob>>;

    /// Non-terminal jobs, earliest first.
    async fn list_active(&self, limit: usize) -> Result<Vec<QueueJob>>;

    async fn get(&self, id: Uuid) -> Result<Option<QueueJob>>;

    async fn count_pending(&self) -> Result<u64>;

    /// `scheduled_at` of the last PENDING job, the planner's append anchor.
    async fn latest_pending_at(&self) -> Result<Option<DateTime<Utc>>>;

    /// Compare-and-swap PENDING → PROCESSING. `None` when the job is gone or
    /// no longer PENDING; exactly one concurrent caller gets `Some`.
    async fn claim(&self, id: Uuid) -> Result<Option<QueueJob>>;

    async fn mark_completed(&self, id: Uuid) -> Result<()>;

    async fn mark_failed(&self, id: Uuid, retry_count: u32, message: &str) -> Result<()>;

    /// Put a failed job back to PENDING at `at`.
    async fn reschedule_with_retry(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        retry_count: u32,
        message: &str,
    ) -> Result<()>;

    /// Edit a PENDING job. `None` when no PENDING job has this id.
    async fn update(&self, id: Uuid, patch: JobPatch) -> Result<Option<QueueJob>>;

    /// Cancel a PENDING job. Claimed jobs cannot be cancelled.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Remove every PENDING job, leaving history intact.
    async fn clear_pending(&self) -> Result<u64>;
}

#[async_trait]
pub trait StrategyStore: Send + Sync {
    async fn load(&self) -> Result<Option<EditorialStrategy>>;

    /// Persist the whole strategy, last write wins.
    async fn save(&self, strategy: &EditorialStrategy) -> Result<EditorialStrategy>;

    /// Read the strategy, writing the seed defaults first if none exists.
    async fn load_or_seed(&self) -> Result<EditorialStrategy> {
        match self.load().await? {
            Some(strategy) => Ok(strategy),
            None => {
                tracing::info!("No editorial strategy found, seeding defaults");
                self.save(&EditorialStrategy::default()).await
            }
        }
    }
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: NewLogEntry) -> Result<ExecutionLogEntry>;

    /// Newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ExecutionLogEntry>>;

    /// Every attempt for one job, newest first.
    async fn for_job(&self, job_id: Uuid) -> Result<Vec<ExecutionLogEntry>>;
}
