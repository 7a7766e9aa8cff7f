//! Heartbeat executor: one short invocation per cron tick. Tops up the queue
//! when it runs low, then claims and runs at most one due job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use newsroom_common::{
    is_config_error, GeneratedArticle, GenerationPipeline, NewLogEntry, QueueJob,
};

use crate::error::Result;
use crate::planner::Planner;
use crate::policy::{retry_delay, DUE_BATCH, LOW_WATER_MARK, MAX_RETRIES};
use crate::traits::{AuditLog, QueueStore, StrategyStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HeartbeatOutcome {
    /// The strategy's kill switch is off.
    Paused,
    /// Nothing due.
    Idle,
    /// Job not found or already processing. Another invocation won the claim.
    AlreadyClaimed { job_id: Uuid },
    Completed {
        job_id: Uuid,
        article: GeneratedArticle,
    },
    Retrying {
        job_id: Uuid,
        attempt: u32,
        next_run: DateTime<Utc>,
        error: String,
    },
    Failed { job_id: Uuid, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartbeatReport {
    /// Jobs appended by the auto-refill, if it ran and succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refilled: Option<usize>,
    #[serde(flatten)]
    pub outcome: HeartbeatOutcome,
}

pub struct Heartbeat {
    queue: Arc<dyn QueueStore>,
    strategies: Arc<dyn StrategyStore>,
    audit: Arc<dyn AuditLog>,
    pipeline: Arc<dyn GenerationPipeline>,
    planner: Planner,
}

impl Heartbeat {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        strategies: Arc<dyn StrategyStore>,
        audit: Arc<dyn AuditLog>,
        pipeline: Arc<dyn GenerationPipeline>,
    ) -> Self {
        let planner = Planner::new(queue.clone(), strategies.clone());
        Self {
            queue,
            strategies,
            audit,
            pipeline,
            planner,
        }
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub async fn beat(&self) -> Result<HeartbeatReport> {
        self.beat_at(Utc::now()).await
    }

    /// One heartbeat with `now` as the clock for due selection, refill
    /// anchoring and retry scheduling. Pipeline errors never escape; store
    /// errors do.
    pub async fn beat_at(&self, now: DateTime<Utc>) -> Result<HeartbeatReport> {
        let strategy = self.strategies.load_or_seed().await?;
        if !strategy.is_active {
            info!("Heartbeat: strategy inactive, skipping");
            return Ok(HeartbeatReport {
                refilled: None,
                outcome: HeartbeatOutcome::Paused,
            });
        }

        let refilled = self.refill_if_low(now).await;

        let due = self.queue.list_due(now, DUE_BATCH).await?;
        let Some(job) = due.into_iter().next() else {
            return Ok(HeartbeatReport {
                refilled,
                outcome: HeartbeatOutcome::Idle,
            });
        };

        let outcome = self.run_job(job.id, now).await?;
        Ok(HeartbeatReport { refilled, outcome })
    }

    /// Run a specific job immediately, regardless of its schedule or the
    /// kill switch. Same claim, finalize and retry path as a heartbeat.
    pub async fn run_now(&self, job_id: Uuid) -> Result<HeartbeatOutcome> {
        self.run_job(job_id, Utc::now()).await
    }

    async fn refill_if_low(&self, now: DateTime<Utc>) -> Option<usize> {
        let pending = match self.queue.count_pending().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Heartbeat: could not count pending jobs");
                return None;
            }
        };
        if pending > LOW_WATER_MARK {
            return None;
        }

        info!(pending, "Heartbeat: queue low, auto-planning");
        match self.planner.generate_schedule_at(false, now).await {
            Ok(n) => Some(n),
            Err(e) => {
                error!(error = %e, "Heartbeat: auto-plan failed");
                None
            }
        }
    }

    async fn run_job(&self, job_id: Uuid, now: DateTime<Utc>) -> Result<HeartbeatOutcome> {
        let Some(job) = self.queue.claim(job_id).await? else {
            info!(job_id = %job_id, "Heartbeat: job not found or already processing");
            return Ok(HeartbeatOutcome::AlreadyClaimed { job_id });
        };

        info!(
            job_id = %job.id,
            mode = %job.job_params.mode,
            attempt = job.retry_count + 1,
            "Heartbeat: executing job"
        );

        match self.pipeline.generate(&job.job_params).await {
            Ok(article) => {
                self.queue.mark_completed(job.id).await?;
                self.append_audit(NewLogEntry::success(
                    job.id,
                    &article.title,
                    article.post_id,
                    now,
                ))
                .await;
                info!(job_id = %job.id, title = %article.title, "Heartbeat: job completed");
                Ok(HeartbeatOutcome::Completed {
                    job_id: job.id,
                    article,
                })
            }
            Err(e) => self.record_failure(&job, &e, now).await,
        }
    }

    async fn record_failure(
        &self,
        job: &QueueJob,
        err: &anyhow::Error,
        now: DateTime<Utc>,
    ) -> Result<HeartbeatOutcome> {
        let message = format!("{err:#}");
        let attempt = job.retry_count + 1;
        self.append_audit(NewLogEntry::failure(job.id, &message, now))
            .await;

        if is_config_error(err) {
            error!(job_id = %job.id, error = %message, "Heartbeat: configuration error, not retrying");
            let log = format!("Configuration error: {message}");
            self.queue.mark_failed(job.id, attempt, &log).await?;
            return Ok(HeartbeatOutcome::Failed {
                job_id: job.id,
                error: message,
            });
        }

        if attempt < MAX_RETRIES {
            let next_run = now + retry_delay();
            warn!(
                job_id = %job.id,
                attempt,
                next_run = %next_run,
                error = %message,
                "Heartbeat: job failed, rescheduling"
            );
            let log = format!("Retry {attempt}: {message}");
            self.queue
                .reschedule_with_retry(job.id, next_run, attempt, &log)
                .await?;
            Ok(HeartbeatOutcome::Retrying {
                job_id: job.id,
                attempt,
                next_run,
                error: message,
            })
        } else {
            error!(job_id = %job.id, attempt, error = %message, "Heartbeat: job failed permanently");
            let log = format!("Max retries reached. Error: {message}");
            self.queue.mark_failed(job.id, attempt, &log).await?;
            Ok(HeartbeatOutcome::Failed {
                job_id: job.id,
                error: message,
            })
        }
    }

    /// The audit trail is secondary to the job's status; a write failure is
    /// logged rather than undoing the transition.
    async fn append_audit(&self, entry: NewLogEntry) {
        let job_id = entry.queue_job_id;
        if let Err(e) = self.audit.record(entry).await {
            error!(job_id = %job_id, error = %e, "Heartbeat: failed to write audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_flat() {
        let report = HeartbeatReport {
            refilled: Some(12),
            outcome: HeartbeatOutcome::Idle,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "idle");
        assert_eq!(json["refilled"], 12);
    }
}
