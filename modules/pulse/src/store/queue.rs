use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use newsroom_common::{JobDescriptor, JobPatch, JobStatus, NewJob, QueueJob};

use super::to_count;
use crate::error::{PulseError, Result};
use crate::traits::QueueStore;

const COLUMNS: &str =
    "id, scheduled_at, status, job_params, retry_count, log_message, created_at";

#[derive(sqlx::FromRow)]
struct QueueRow {
    id: Uuid,
    scheduled_at: DateTime<Utc>,
    status: String,
    job_params: Json<JobDescriptor>,
    retry_count: i32,
    log_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<QueueRow> for QueueJob {
    type Error = PulseError;

    fn try_from(row: QueueRow) -> Result<Self> {
        Ok(QueueJob {
            id: row.id,
            scheduled_at: row.scheduled_at,
            status: row.status.parse()?,
            job_params: row.job_params.0,
            retry_count: to_count(row.retry_count, "retry_count")?,
            log_message: row.log_message,
            created_at: row.created_at,
        })
    }
}

fn into_jobs(rows: Vec<QueueRow>) -> Result<Vec<QueueJob>> {
    rows.into_iter().map(QueueJob::try_from).collect()
}

/// Job queue in the `pulse_queue` table.
#[derive(Clone)]
pub struct PgQueueStore {
    pool: PgPool,
}

impl PgQueueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueStore for PgQueueStore {
    async fn enqueue(&self, jobs: Vec<NewJob>) -> Result<Vec<QueueJob>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(jobs.len());

        for job in jobs {
            let row = sqlx::query_as::<_, QueueRow>(&format!(
                r#"
                INSERT INTO pulse_queue (id, scheduled_at, status, job_params)
                VALUES ($1, $2, 'PENDING', $3)
                RETURNING {COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(job.scheduled_at)
            .bind(Json(&job.job_params))
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(QueueJob::try_from(row)?);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueueJob>> {
        let rows = sqlx::query_as::<_, QueueRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM pulse_queue
            WHERE status = 'PENDING' AND scheduled_at <= $1
            ORDER BY scheduled_at ASC
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        into_jobs(rows)
    }

    async fn list_active(&self, limit: usize) -> Result<Vec<QueueJob>> {
        let rows = sqlx::query_as::<_, QueueRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM pulse_queue
            WHERE status IN ('PENDING', 'PROCESSING')
            ORDER BY scheduled_at ASC
            LIMIT $1
            "#
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        into_jobs(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<QueueJob>> {
        sqlx::query_as::<_, QueueRow>(&format!("SELECT {COLUMNS} FROM pulse_queue WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(QueueJob::try_from)
            .transpose()
    }

    async fn count_pending(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pulse_queue WHERE status = 'PENDING'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn latest_pending_at(&self) -> Result<Option<DateTime<Utc>>> {
        let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(scheduled_at) FROM pulse_queue WHERE status = 'PENDING'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }

    async fn claim(&self, id: Uuid) -> Result<Option<QueueJob>> {
        // Single-statement compare-and-swap; the row lock serializes racers and
        // the loser sees status <> 'PENDING' and matches nothing.
        sqlx::query_as::<_, QueueRow>(&format!(
            r#"
            UPDATE pulse_queue SET status = 'PROCESSING'
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(QueueJob::try_from)
        .transpose()
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE pulse_queue SET status = $2, log_message = NULL WHERE id = $1")
            .bind(id)
            .bind(JobStatus::Completed.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, retry_count: u32, message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE pulse_queue SET status = $2, retry_count = $3, log_message = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(JobStatus::Failed.as_str())
        .bind(retry_count as i32)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reschedule_with_retry(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        retry_count: u32,
        message: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE pulse_queue
            SET status = $2, scheduled_at = $3, retry_count = $4, log_message = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(JobStatus::Pending.as_str())
        .bind(at)
        .bind(retry_count as i32)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: JobPatch) -> Result<Option<QueueJob>> {
        sqlx::query_as::<_, QueueRow>(&format!(
            r#"
            UPDATE pulse_queue
            SET scheduled_at = COALESCE($2, scheduled_at),
                job_params = COALESCE($3, job_params)
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.scheduled_at)
        .bind(patch.job_params.map(Json))
        .fetch_optional(&self.pool)
        .await?
        .map(QueueJob::try_from)
        .transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pulse_queue WHERE id = $1 AND status = 'PENDING'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_pending(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pulse_queue WHERE status = 'PENDING'")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
