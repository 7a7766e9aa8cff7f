// Test mocks for the scheduler.
//
// One in-memory mock per storage seam plus a scripted pipeline:
// - MockQueueStore (QueueStore), Mutex-guarded so the claim is atomic
// - MockStrategyStore (StrategyStore)
// - MockAuditLog (AuditLog)
// - ScriptedPipeline (GenerationPipeline), plays back queued outcomes

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use newsroom_common::{
    EditorialStrategy, ExecutionLogEntry, GeneratedArticle, GenerationPipeline, JobConfig,
    JobDescriptor, JobMode, JobPatch, JobStatus, NewJob, NewLogEntry, NewsroomError, QueueJob,
};

use crate::error::Result;
use crate::traits::{AuditLog, QueueStore, StrategyStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Minimal executable descriptor.
pub fn manual_descriptor(text: &str) -> JobDescriptor {
    JobDescriptor {
        mode: JobMode::Manual,
        config: JobConfig {
            content_input: Some(text.to_string()),
            ..Default::default()
        },
    }
}

pub fn article(title: &str) -> GeneratedArticle {
    GeneratedArticle {
        post_id: Uuid::new_v4(),
        title: title.to_string(),
        author: "Test Desk".to_string(),
        category: "Technology".to_string(),
        has_chart: false,
        has_sidebar: true,
        has_social: true,
    }
}

// ---------------------------------------------------------------------------
// MockQueueStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockQueueStore {
    jobs: Mutex<Vec<QueueJob>>,
}

impl MockQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job directly in any status. Returns its id.
    pub fn seed(&self, scheduled_at: DateTime<Utc>, status: JobStatus) -> Uuid {
        let job = QueueJob {
            id: Uuid::new_v4(),
            scheduled_at,
            status,
            job_params: manual_descriptor("seeded"),
            retry_count: 0,
            log_message: None,
            created_at: Utc::now(),
        };
        let id = job.id;
        self.jobs.lock().unwrap().push(job);
        id
    }

    pub fn all(&self) -> Vec<QueueJob> {
        let mut jobs = self.jobs.lock().unwrap().clone();
        jobs.sort_by_key(|j| j.scheduled_at);
        jobs
    }

    pub fn find(&self, id: Uuid) -> Option<QueueJob> {
        self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    pub fn with_status(&self, status: JobStatus) -> Vec<QueueJob> {
        self.all().into_iter().filter(|j| j.status == status).collect()
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut QueueJob)) {
        if let Some(job) = self.jobs.lock().unwrap().iter_mut().find(|j| j.id == id) {
            f(job);
        }
    }
}

#[async_trait]
impl QueueStore for MockQueueStore {
    async fn enqueue(&self, jobs: Vec<NewJob>) -> Result<Vec<QueueJob>> {
        let now = Utc::now();
        let inserted: Vec<QueueJob> = jobs
            .into_iter()
            .map(|j| QueueJob {
                id: Uuid::new_v4(),
                scheduled_at: j.scheduled_at,
                status: JobStatus::Pending,
                job_params: j.job_params,
                retry_count: 0,
                log_message: None,
                created_at: now,
            })
            .collect();
        self.jobs.lock().unwrap().extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueueJob>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|j| j.status == JobStatus::Pending && j.scheduled_at <= now)
            .take(limit)
            .collect())
    }

    async fn list_active(&self, limit: usize) -> Result<Vec<QueueJob>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|j| matches!(j.status, JobStatus::Pending | JobStatus::Processing))
            .take(limit)
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<QueueJob>> {
        Ok(self.find(id))
    }

    async fn count_pending(&self) -> Result<u64> {
        Ok(self.with_status(JobStatus::Pending).len() as u64)
    }

    async fn latest_pending_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .with_status(JobStatus::Pending)
            .iter()
            .map(|j| j.scheduled_at)
            .max())
    }

    async fn claim(&self, id: Uuid) -> Result<Option<QueueJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == JobStatus::Pending)
        {
            Some(job) => {
                job.status = JobStatus::Processing;
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        self.modify(id, |j| {
            j.status = JobStatus::Completed;
            j.log_message = None;
        });
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, retry_count: u32, message: &str) -> Result<()> {
        self.modify(id, |j| {
            j.status = JobStatus::Failed;
            j.retry_count = retry_count;
            j.log_message = Some(message.to_string());
        });
        Ok(())
    }

    async fn reschedule_with_retry(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        retry_count: u32,
        message: &str,
    ) -> Result<()> {
        self.modify(id, |j| {
            j.status = JobStatus::Pending;
            j.scheduled_at = at;
            j.retry_count = retry_count;
            j.log_message = Some(message.to_string());
        });
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: JobPatch) -> Result<Option<QueueJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == JobStatus::Pending)
        else {
            return Ok(None);
        };
        if let Some(at) = patch.scheduled_at {
            job.scheduled_at = at;
        }
        if let Some(params) = patch.job_params {
            job.job_params = params;
        }
        Ok(Some(job.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| !(j.id == id && j.status == JobStatus::Pending));
        Ok(jobs.len() < before)
    }

    async fn clear_pending(&self) -> Result<u64> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.status != JobStatus::Pending);
        Ok((before - jobs.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// MockStrategyStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockStrategyStore {
    strategy: Mutex<Option<EditorialStrategy>>,
}

impl MockStrategyStore {
    /// Empty store; the first `load_or_seed` writes the defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(strategy: EditorialStrategy) -> Self {
        Self {
            strategy: Mutex::new(Some(strategy)),
        }
    }

    pub fn current(&self) -> Option<EditorialStrategy> {
        self.strategy.lock().unwrap().clone()
    }
}

#[async_trait]
impl StrategyStore for MockStrategyStore {
    async fn load(&self) -> Result<Option<EditorialStrategy>> {
        Ok(self.current())
    }

    async fn save(&self, strategy: &EditorialStrategy) -> Result<EditorialStrategy> {
        let mut saved = strategy.clone();
        saved.updated_at = Some(Utc::now());
        *self.strategy.lock().unwrap() = Some(saved.clone());
        Ok(saved)
    }
}

// ---------------------------------------------------------------------------
// MockAuditLog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockAuditLog {
    entries: Mutex<Vec<ExecutionLogEntry>>,
}

impl MockAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ExecutionLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLog for MockAuditLog {
    async fn record(&self, entry: NewLogEntry) -> Result<ExecutionLogEntry> {
        let stored = ExecutionLogEntry {
            id: Uuid::new_v4(),
            queue_job_id: entry.queue_job_id,
            status: entry.status,
            result_summary: entry.result_summary,
            executed_at: entry.executed_at,
        };
        self.entries.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExecutionLogEntry>> {
        let mut entries = self.entries();
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    async fn for_job(&self, job_id: Uuid) -> Result<Vec<ExecutionLogEntry>> {
        let mut entries: Vec<_> = self
            .entries()
            .into_iter()
            .filter(|e| e.queue_job_id == job_id)
            .collect();
        entries.reverse();
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// ScriptedPipeline
// ---------------------------------------------------------------------------

enum Step {
    Publish(String),
    Fail(String),
    ConfigError(String),
}

/// Plays back a script of outcomes, one per call. Once the script is
/// exhausted every call fails. Records each descriptor it receives.
#[derive(Default)]
pub struct ScriptedPipeline {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<JobDescriptor>>,
}

impl ScriptedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_publish(self, title: &str) -> Self {
        self.push(Step::Publish(title.to_string()))
    }

    pub fn then_fail(self, error: &str) -> Self {
        self.push(Step::Fail(error.to_string()))
    }

    pub fn then_config_error(self, error: &str) -> Self {
        self.push(Step::ConfigError(error.to_string()))
    }

    pub fn calls(&self) -> Vec<JobDescriptor> {
        self.calls.lock().unwrap().clone()
    }

    fn push(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }
}

#[async_trait]
impl GenerationPipeline for ScriptedPipeline {
    async fn generate(&self, job: &JobDescriptor) -> anyhow::Result<GeneratedArticle> {
        self.calls.lock().unwrap().push(job.clone());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Publish(title)) => Ok(article(&title)),
            Some(Step::Fail(error)) => Err(anyhow!(error)),
            Some(Step::ConfigError(error)) => Err(NewsroomError::Config(error).into()),
            None => Err(anyhow!("ScriptedPipeline: script exhausted")),
        }
    }
}
