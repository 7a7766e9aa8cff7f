use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use newsroom_common::{ExecutionLogEntry, NewLogEntry, ResultSummary};

use crate::error::{PulseError, Result};
use crate::traits::AuditLog;

#[derive(sqlx::FromRow)]
struct LogRow {
    id: Uuid,
    queue_job_id: Uuid,
    status: String,
    result_summary: Json<ResultSummary>,
    executed_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for ExecutionLogEntry {
    type Error = PulseError;

    fn try_from(row: LogRow) -> Result<Self> {
        Ok(ExecutionLogEntry {
            id: row.id,
            queue_job_id: row.queue_job_id,
            status: row.status.parse()?,
            result_summary: row.result_summary.0,
            executed_at: row.executed_at,
        })
    }
}

/// Append-only `pulse_logs`. Rows are never updated.
#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn record(&self, entry: NewLogEntry) -> Result<ExecutionLogEntry> {
        let row = sqlx::query_as::<_, LogRow>(
            r#"
            INSERT INTO pulse_logs (id, queue_job_id, status, result_summary, executed_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, queue_job_id, status, result_summary, executed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.queue_job_id)
        .bind(entry.status.as_str())
        .bind(Json(&entry.result_summary))
        .bind(entry.executed_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExecutionLogEntry>> {
        sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, queue_job_id, status, result_summary, executed_at
            FROM pulse_logs
            ORDER BY executed_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ExecutionLogEntry::try_from)
        .collect()
    }

    async fn for_job(&self, job_id: Uuid) -> Result<Vec<ExecutionLogEntry>> {
        sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, queue_job_id, status, result_summary, executed_at
            FROM pulse_logs
            WHERE queue_job_id = $1
            ORDER BY executed_at DESC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ExecutionLogEntry::try_from)
        .collect()
    }
}
