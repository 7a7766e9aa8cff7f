//! Planner and heartbeat scenarios against the in-memory stores.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use newsroom_common::{
    EditorialStrategy, ExecutionStatus, JobMode, JobStatus, ResultSummary, WeightTable,
};
use pulse::testing::{MockAuditLog, MockQueueStore, MockStrategyStore, ScriptedPipeline};
use pulse::{Heartbeat, HeartbeatOutcome, Planner, PulseError, QueueStore};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
}

struct Rig {
    queue: Arc<MockQueueStore>,
    strategies: Arc<MockStrategyStore>,
    audit: Arc<MockAuditLog>,
    heartbeat: Heartbeat,
}

fn rig(strategy: EditorialStrategy, pipeline: ScriptedPipeline) -> Rig {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(strategy));
    let audit = Arc::new(MockAuditLog::new());
    let heartbeat = Heartbeat::new(
        queue.clone(),
        strategies.clone(),
        audit.clone(),
        Arc::new(pipeline),
    );
    Rig {
        queue,
        strategies,
        audit,
        heartbeat,
    }
}

fn planner(queue: &Arc<MockQueueStore>, strategies: &Arc<MockStrategyStore>) -> Planner {
    Planner::new(queue.clone(), strategies.clone())
}

// =========================================================================
// Planner
// =========================================================================

#[tokio::test]
async fn twelve_per_day_spaced_two_hours_starting_after_now() {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(EditorialStrategy::default()));

    let count = planner(&queue, &strategies)
        .generate_schedule_at(false, t0())
        .await
        .unwrap();

    assert_eq!(count, 12);
    let jobs = queue.all();
    assert!(jobs[0].scheduled_at > t0());
    for pair in jobs.windows(2) {
        assert_eq!(pair[1].scheduled_at - pair[0].scheduled_at, Duration::hours(2));
    }
    assert!(jobs.iter().all(|j| j.status == JobStatus::Pending));
}

#[tokio::test]
async fn append_never_precedes_existing_pending() {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(EditorialStrategy::default()));
    let planner = planner(&queue, &strategies);

    planner.generate_schedule_at(false, t0()).await.unwrap();
    let first_batch_end = queue.all().last().unwrap().scheduled_at;

    planner.generate_schedule_at(false, t0()).await.unwrap();

    let jobs = queue.all();
    assert_eq!(jobs.len(), 24);
    let second_batch: Vec<_> = jobs.iter().skip(12).collect();
    assert!(second_batch.iter().all(|j| j.scheduled_at > first_batch_end));
    assert_eq!(
        second_batch[0].scheduled_at - first_batch_end,
        Duration::hours(2)
    );
}

#[tokio::test]
async fn append_anchors_on_last_pending_even_when_past() {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(EditorialStrategy::default()));
    let stale = t0() - Duration::hours(5);
    queue.seed(stale, JobStatus::Pending);

    planner(&queue, &strategies)
        .generate_schedule_at(false, t0())
        .await
        .unwrap();

    let jobs = queue.all();
    assert_eq!(jobs[1].scheduled_at, stale + Duration::hours(2));
}

#[tokio::test]
async fn regenerate_clears_pending_and_keeps_history() {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(EditorialStrategy::default()));
    let old_pending = queue.seed(t0() + Duration::days(3), JobStatus::Pending);
    let completed = queue.seed(t0() - Duration::hours(1), JobStatus::Completed);
    let failed = queue.seed(t0() - Duration::hours(2), JobStatus::Failed);

    planner(&queue, &strategies)
        .generate_schedule_at(true, t0())
        .await
        .unwrap();

    assert!(queue.find(old_pending).is_none());
    assert!(queue.find(completed).is_some());
    assert!(queue.find(failed).is_some());

    let pending = queue.with_status(JobStatus::Pending);
    assert_eq!(pending.len(), 12);
    assert_eq!(pending[0].scheduled_at, t0() + Duration::hours(2));
}

#[tokio::test]
async fn missing_strategy_is_fatal() {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::empty());

    let err = planner(&queue, &strategies)
        .generate_schedule_at(false, t0())
        .await
        .unwrap_err();

    assert!(matches!(err, PulseError::StrategyMissing));
    assert!(err.is_config());
    assert!(queue.all().is_empty());
}

#[tokio::test]
async fn oversized_daily_target_is_rejected_before_enqueue() {
    let mut strategy = EditorialStrategy::default();
    strategy.articles_per_day = 100_000_000;
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(strategy));

    let err = planner(&queue, &strategies)
        .generate_schedule_at(true, t0())
        .await
        .unwrap_err();

    assert!(err.is_config());
    assert!(err.to_string().contains("articles_per_day"));
    assert!(queue.all().is_empty());
}

#[tokio::test]
async fn rss_us_four_per_day_end_to_end() {
    let mut strategy = EditorialStrategy::default();
    strategy.articles_per_day = 4;
    strategy.source_weights = WeightTable::from_pairs(&[("rss", 100.0)]);
    strategy.region_weights = WeightTable::from_pairs(&[("US", 100.0)]);
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(strategy));

    let count = planner(&queue, &strategies)
        .generate_schedule_at(true, t0())
        .await
        .unwrap();

    assert_eq!(count, 4);
    let jobs = queue.all();
    let offsets: Vec<i64> = jobs
        .iter()
        .map(|j| (j.scheduled_at - t0()).num_hours())
        .collect();
    assert_eq!(offsets, vec![6, 12, 18, 24]);
    for job in &jobs {
        assert_eq!(job.job_params.mode, JobMode::SpecificRss);
        assert_eq!(job.job_params.config.target_region.as_deref(), Some("US"));
        assert!(job.job_params.config.rss_url.is_some());
        assert!(job.job_params.config.preferred_image_source.is_some());
    }
}

// =========================================================================
// Queue store contract
// =========================================================================

#[tokio::test]
async fn only_past_jobs_are_due() {
    let queue = MockQueueStore::new();
    let past = queue.seed(t0() - Duration::hours(1), JobStatus::Pending);
    queue.seed(t0() + Duration::hours(1), JobStatus::Pending);

    let due = queue.list_due(t0(), 10).await.unwrap();

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, past);
}

#[tokio::test]
async fn concurrent_claims_have_one_winner() {
    let queue = Arc::new(MockQueueStore::new());
    let id = queue.seed(t0(), JobStatus::Pending);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let queue = queue.clone();
            tokio::spawn(async move { queue.claim(id).await.unwrap() })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(queue.find(id).unwrap().status, JobStatus::Processing);
}

// =========================================================================
// Heartbeat
// =========================================================================

#[tokio::test]
async fn heartbeat_completes_due_job_and_audits() {
    let r = rig(
        EditorialStrategy::default(),
        ScriptedPipeline::new().then_publish("Chips Get Smaller"),
    );
    // Keep the queue above the low-water mark so no refill happens.
    let due = r.queue.seed(t0() - Duration::minutes(5), JobStatus::Pending);
    for h in 1..=3 {
        r.queue.seed(t0() + Duration::hours(h), JobStatus::Pending);
    }

    let report = r.heartbeat.beat_at(t0()).await.unwrap();

    assert_eq!(report.refilled, None);
    assert!(matches!(
        report.outcome,
        HeartbeatOutcome::Completed { job_id, .. } if job_id == due
    ));
    assert_eq!(r.queue.find(due).unwrap().status, JobStatus::Completed);

    let entries = r.audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, ExecutionStatus::Success);
    assert!(matches!(
        &entries[0].result_summary,
        ResultSummary::Published { title, .. } if title == "Chips Get Smaller"
    ));
}

#[tokio::test]
async fn heartbeat_with_nothing_due_is_a_no_op() {
    let r = rig(EditorialStrategy::default(), ScriptedPipeline::new());
    for h in 1..=3 {
        r.queue.seed(t0() + Duration::hours(h), JobStatus::Pending);
    }

    let report = r.heartbeat.beat_at(t0()).await.unwrap();

    assert_eq!(report.outcome, HeartbeatOutcome::Idle);
    assert!(r.audit.entries().is_empty());
}

#[tokio::test]
async fn low_queue_triggers_append_refill() {
    let r = rig(EditorialStrategy::default(), ScriptedPipeline::new());
    let last = t0() + Duration::hours(3);
    r.queue.seed(last, JobStatus::Pending);

    let report = r.heartbeat.beat_at(t0()).await.unwrap();

    assert_eq!(report.refilled, Some(12));
    assert_eq!(report.outcome, HeartbeatOutcome::Idle);
    let pending = r.queue.with_status(JobStatus::Pending);
    assert_eq!(pending.len(), 13);
    assert_eq!(pending[1].scheduled_at, last + Duration::hours(2));
}

#[tokio::test]
async fn failed_refill_does_not_block_due_job() {
    let mut strategy = EditorialStrategy::default();
    strategy.image_weights = WeightTable::new();
    let r = rig(strategy, ScriptedPipeline::new().then_publish("Still Runs"));
    let due = r.queue.seed(t0() - Duration::minutes(1), JobStatus::Pending);

    let report = r.heartbeat.beat_at(t0()).await.unwrap();

    assert_eq!(report.refilled, None);
    assert!(matches!(report.outcome, HeartbeatOutcome::Completed { .. }));
    assert_eq!(r.queue.find(due).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn retries_then_fails_after_three_attempts() {
    let r = rig(
        EditorialStrategy::default(),
        ScriptedPipeline::new()
            .then_fail("feed timed out")
            .then_fail("feed timed out")
            .then_fail("feed timed out"),
    );
    let id = r.queue.seed(t0() - Duration::minutes(1), JobStatus::Pending);

    let first = r.heartbeat.beat_at(t0()).await.unwrap();
    assert!(matches!(
        first.outcome,
        HeartbeatOutcome::Retrying { attempt: 1, next_run, .. } if next_run == t0() + Duration::minutes(15)
    ));
    let job = r.queue.find(id).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.retry_count, 1);
    assert_eq!(job.log_message.as_deref(), Some("Retry 1: feed timed out"));

    let second = r
        .heartbeat
        .beat_at(t0() + Duration::minutes(16))
        .await
        .unwrap();
    assert!(matches!(
        second.outcome,
        HeartbeatOutcome::Retrying { job_id, attempt: 2, .. } if job_id == id
    ));

    let third = r
        .heartbeat
        .beat_at(t0() + Duration::minutes(32))
        .await
        .unwrap();
    assert!(matches!(third.outcome, HeartbeatOutcome::Failed { job_id, .. } if job_id == id));

    let job = r.queue.find(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.retry_count, 3);
    assert_eq!(
        job.log_message.as_deref(),
        Some("Max retries reached. Error: feed timed out")
    );

    let entries = r.audit.entries();
    assert_eq!(entries.len(), 3);
    assert!(entries
        .iter()
        .all(|e| e.status == ExecutionStatus::Failure && e.queue_job_id == id));
}

#[tokio::test]
async fn configuration_error_fails_without_retry() {
    let r = rig(
        EditorialStrategy::default(),
        ScriptedPipeline::new().then_config_error("GEMINI_API_KEY not set"),
    );
    let id = r.queue.seed(t0() - Duration::minutes(1), JobStatus::Pending);

    let report = r.heartbeat.beat_at(t0()).await.unwrap();

    assert!(matches!(report.outcome, HeartbeatOutcome::Failed { .. }));
    let job = r.queue.find(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.retry_count, 1);
    assert_eq!(r.audit.entries().len(), 1);
}

#[tokio::test]
async fn inactive_strategy_pauses_heartbeat() {
    let mut strategy = EditorialStrategy::default();
    strategy.is_active = false;
    let r = rig(strategy, ScriptedPipeline::new().then_publish("Unused"));
    let id = r.queue.seed(t0() - Duration::minutes(1), JobStatus::Pending);

    let report = r.heartbeat.beat_at(t0()).await.unwrap();

    assert_eq!(report.outcome, HeartbeatOutcome::Paused);
    assert_eq!(r.queue.find(id).unwrap().status, JobStatus::Pending);
    assert_eq!(r.queue.all().len(), 1);
}

#[tokio::test]
async fn heartbeat_seeds_missing_strategy() {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::empty());
    let heartbeat = Heartbeat::new(
        queue.clone(),
        strategies.clone(),
        Arc::new(MockAuditLog::new()),
        Arc::new(ScriptedPipeline::new()),
    );

    let report = heartbeat.beat_at(t0()).await.unwrap();

    assert_eq!(report.refilled, Some(12));
    assert_eq!(strategies.current().unwrap().articles_per_day, 12);
}

#[tokio::test]
async fn run_now_on_claimed_job_is_benign() {
    let r = rig(EditorialStrategy::default(), ScriptedPipeline::new());
    let id = r.queue.seed(t0(), JobStatus::Processing);

    let outcome = r.heartbeat.run_now(id).await.unwrap();

    assert_eq!(outcome, HeartbeatOutcome::AlreadyClaimed { job_id: id });
    assert!(r.audit.entries().is_empty());
}

#[tokio::test]
async fn run_now_ignores_schedule_and_kill_switch() {
    let mut strategy = EditorialStrategy::default();
    strategy.is_active = false;
    let pipeline = ScriptedPipeline::new().then_publish("Early Edition");
    let r = rig(strategy, pipeline);
    let id = r.queue.seed(Utc::now() + Duration::days(2), JobStatus::Pending);

    let outcome = r.heartbeat.run_now(id).await.unwrap();

    assert!(matches!(outcome, HeartbeatOutcome::Completed { .. }));
    assert_eq!(r.queue.find(id).unwrap().status, JobStatus::Completed);
    assert!(!r.strategies.current().unwrap().is_active);
}

#[tokio::test]
async fn pipeline_receives_stored_descriptor_unchanged() {
    let pipeline = Arc::new(ScriptedPipeline::new().then_publish("As Planned"));
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(MockStrategyStore::with(EditorialStrategy::default()));
    let heartbeat = Heartbeat::new(
        queue.clone(),
        strategies.clone(),
        Arc::new(MockAuditLog::new()),
        pipeline.clone(),
    );
    planner(&queue, &strategies)
        .generate_schedule_at(false, t0())
        .await
        .unwrap();
    let first = queue.all()[0].clone();

    heartbeat
        .beat_at(first.scheduled_at + Duration::seconds(1))
        .await
        .unwrap();

    assert_eq!(pipeline.calls(), vec![first.job_params]);
}
