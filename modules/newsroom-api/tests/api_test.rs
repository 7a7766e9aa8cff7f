//! Router tests over in-memory stores and mock engines.

use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use newsroom_api::{build_router, AppState};
use newsroom_common::{
    is_config_error, EditorialStrategy, GenerationPipeline, JobConfig, JobDescriptor, JobMode,
    JobStatus, NewsMode,
};
use phantom::testing::{Harness, MemoryImageStorage, MockNews, MockWriter};
use phantom::{Phantom, RemotePipeline};
use pulse::testing::{MockAuditLog, MockQueueStore, MockStrategyStore, ScriptedPipeline};

const SECRET: &str = "test-secret";

struct Rig {
    queue: Arc<MockQueueStore>,
    strategies: Arc<MockStrategyStore>,
    audit: Arc<MockAuditLog>,
    media: Arc<MemoryImageStorage>,
    router: Router,
}

fn rig_with(
    strategies: MockStrategyStore,
    pipeline: ScriptedPipeline,
    engine: Arc<dyn GenerationPipeline>,
) -> Rig {
    let queue = Arc::new(MockQueueStore::new());
    let strategies = Arc::new(strategies);
    let audit = Arc::new(MockAuditLog::new());
    let media = Arc::new(MemoryImageStorage::new());
    let state = AppState::new(
        queue.clone(),
        strategies.clone(),
        audit.clone(),
        Arc::new(pipeline),
        engine,
        media.clone(),
        SECRET,
    );
    Rig {
        queue,
        strategies,
        audit,
        media,
        router: build_router(Arc::new(state)),
    }
}

fn rig(pipeline: ScriptedPipeline) -> Rig {
    rig_with(
        MockStrategyStore::with(EditorialStrategy::default()),
        pipeline,
        Arc::new(ScriptedPipeline::new()),
    )
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        headers,
        body,
    }
}

async fn authed(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    send(router, method, uri, Some(SECRET), body).await
}

// =========================================================================
// Auth and health
// =========================================================================

#[tokio::test]
async fn every_protected_route_rejects_a_bad_bearer() {
    let r = rig(ScriptedPipeline::new());
    let routes = [
        (Method::GET, "/strategy"),
        (Method::POST, "/strategy"),
        (Method::GET, "/queue"),
        (Method::PATCH, "/queue"),
        (Method::DELETE, "/queue?id=x"),
        (Method::POST, "/queue/run"),
        (Method::GET, "/logs"),
        (Method::POST, "/plan"),
        (Method::GET, "/cron/daily-plan"),
        (Method::GET, "/cron/heartbeat"),
        (Method::POST, "/engine/generate"),
    ];

    for (method, uri) in routes {
        let missing = send(&r.router, method.clone(), uri, None, None).await;
        assert_eq!(missing.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(missing.json(), json!({ "error": "Unauthorized" }));

        let wrong = send(&r.router, method.clone(), uri, Some("nope"), None).await;
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    // Nothing ran or was planned.
    assert!(r.queue.all().is_empty());
    assert!(r.audit.entries().is_empty());
}

#[tokio::test]
async fn health_is_public() {
    let r = rig(ScriptedPipeline::new());
    let reply = send(&r.router, Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(&reply.body[..], b"ok");
    assert_eq!(reply.headers[header::CACHE_CONTROL], "no-store");
}

// =========================================================================
// Strategy
// =========================================================================

#[tokio::test]
async fn get_strategy_seeds_defaults() {
    let r = rig_with(
        MockStrategyStore::empty(),
        ScriptedPipeline::new(),
        Arc::new(ScriptedPipeline::new()),
    );

    let reply = authed(&r.router, Method::GET, "/strategy", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["config"]["articles_per_day"], 12);
    assert!(r.strategies.current().is_some());
}

#[tokio::test]
async fn save_strategy_merges_partial_body() {
    let r = rig(ScriptedPipeline::new());

    let reply = authed(
        &r.router,
        Method::POST,
        "/strategy",
        Some(json!({ "articles_per_day": 4, "region_weights": { "US": 100 } })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    let stored = r.strategies.current().unwrap();
    assert_eq!(stored.articles_per_day, 4);
    assert_eq!(stored.region_weights.first_label(), Some("US"));
    assert_eq!(stored.region_weights.iter().count(), 1);
    // Untouched fields survive the merge.
    assert_eq!(stored.topic_list, EditorialStrategy::default().topic_list);
    assert_eq!(reply.json()["config"]["articles_per_day"], 4);
}

#[tokio::test]
async fn invalid_strategy_is_rejected_without_saving() {
    let r = rig(ScriptedPipeline::new());

    let reply = authed(
        &r.router,
        Method::POST,
        "/strategy",
        Some(json!({ "articles_per_day": 0 })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json()["error"].as_str().unwrap().contains("articles_per_day"));
    assert_eq!(r.strategies.current().unwrap().articles_per_day, 12);
}

// =========================================================================
// Queue
// =========================================================================

#[tokio::test]
async fn queue_lists_only_active_jobs_in_order() {
    let r = rig(ScriptedPipeline::new());
    let now = Utc::now();
    let later = r.queue.seed(now + Duration::hours(3), JobStatus::Pending);
    let sooner = r.queue.seed(now + Duration::hours(1), JobStatus::Pending);
    r.queue.seed(now - Duration::hours(1), JobStatus::Completed);
    r.queue.seed(now - Duration::hours(2), JobStatus::Failed);

    let reply = authed(&r.router, Method::GET, "/queue", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    let queue = reply.json()["queue"].as_array().unwrap().clone();
    let ids: Vec<&str> = queue.iter().map(|j| j["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![sooner.to_string(), later.to_string()]);
}

#[tokio::test]
async fn patch_edits_a_pending_job() {
    let r = rig(ScriptedPipeline::new());
    let id = r.queue.seed(Utc::now() + Duration::hours(1), JobStatus::Pending);
    let new_time = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    let reply = authed(
        &r.router,
        Method::PATCH,
        "/queue",
        Some(json!({ "id": id, "scheduled_at": new_time })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(r.queue.find(id).unwrap().scheduled_at, new_time);
}

#[tokio::test]
async fn patch_without_id_or_on_claimed_job_changes_nothing() {
    let r = rig(ScriptedPipeline::new());
    let claimed = r.queue.seed(Utc::now(), JobStatus::Processing);

    let missing = authed(&r.router, Method::PATCH, "/queue", Some(json!({}))).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json(), json!({ "error": "Missing ID" }));

    let reply = authed(
        &r.router,
        Method::PATCH,
        "/queue",
        Some(json!({ "id": claimed, "scheduled_at": "2030-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_ne!(
        r.queue.find(claimed).unwrap().scheduled_at,
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn patch_with_no_fields_is_rejected() {
    let r = rig(ScriptedPipeline::new());
    let id = r.queue.seed(Utc::now() + Duration::hours(1), JobStatus::Pending);
    let before = r.queue.find(id).unwrap();

    let reply = authed(&r.router, Method::PATCH, "/queue", Some(json!({ "id": id }))).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "error": "Nothing to update" }));
    assert_eq!(r.queue.find(id).unwrap().scheduled_at, before.scheduled_at);
}

#[tokio::test]
async fn delete_cancels_pending_jobs_only() {
    let r = rig(ScriptedPipeline::new());
    let pending = r.queue.seed(Utc::now() + Duration::hours(1), JobStatus::Pending);
    let claimed = r.queue.seed(Utc::now(), JobStatus::Processing);

    let missing = authed(&r.router, Method::DELETE, "/queue", None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json(), json!({ "error": "Missing ID" }));

    let ok = authed(&r.router, Method::DELETE, &format!("/queue?id={pending}"), None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(r.queue.find(pending).is_none());

    let refused = authed(&r.router, Method::DELETE, &format!("/queue?id={claimed}"), None).await;
    assert_eq!(refused.status, StatusCode::NOT_FOUND);
    assert!(r.queue.find(claimed).is_some());
}

#[tokio::test]
async fn manual_run_executes_once() {
    let r = rig(ScriptedPipeline::new().then_publish("Harbor Reopens"));
    let id = r.queue.seed(Utc::now() + Duration::hours(5), JobStatus::Pending);

    let reply = authed(&r.router, Method::POST, "/queue/run", Some(json!({ "id": id }))).await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["article"]["title"], "Harbor Reopens");
    assert_eq!(r.queue.find(id).unwrap().status, JobStatus::Completed);
    assert_eq!(r.audit.entries().len(), 1);

    let again = authed(&r.router, Method::POST, "/queue/run", Some(json!({ "id": id }))).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(
        again.json(),
        json!({ "error": "Job not found or already processing" })
    );
    assert_eq!(r.audit.entries().len(), 1);
}

#[tokio::test]
async fn failed_manual_run_is_rescheduled() {
    let r = rig(ScriptedPipeline::new().then_fail("provider down"));
    let id = r.queue.seed(Utc::now() + Duration::hours(5), JobStatus::Pending);

    let reply = authed(&r.router, Method::POST, "/queue/run", Some(json!({ "id": id }))).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = reply.json();
    assert_eq!(body["outcome"], "retrying");
    assert!(body["error"].as_str().unwrap().contains("provider down"));

    let job = r.queue.find(id).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.retry_count, 1);
}

#[tokio::test]
async fn run_without_id_is_a_bad_request() {
    let r = rig(ScriptedPipeline::new());
    let reply = authed(&r.router, Method::POST, "/queue/run", Some(json!({}))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "error": "Missing Job ID" }));
}

// =========================================================================
// Planning, cron and logs
// =========================================================================

#[tokio::test]
async fn regenerate_replaces_pending_jobs() {
    let r = rig(ScriptedPipeline::new());
    let old = r.queue.seed(Utc::now() + Duration::hours(1), JobStatus::Pending);
    let done = r.queue.seed(Utc::now() - Duration::hours(1), JobStatus::Completed);

    let reply = authed(&r.router, Method::POST, "/plan", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["count"], 12);
    assert!(r.queue.find(old).is_none());
    assert!(r.queue.find(done).is_some());
    assert_eq!(r.queue.with_status(JobStatus::Pending).len(), 12);
}

#[tokio::test]
async fn planning_without_strategy_is_fatal() {
    let r = rig_with(
        MockStrategyStore::empty(),
        ScriptedPipeline::new(),
        Arc::new(ScriptedPipeline::new()),
    );

    let reply = authed(&r.router, Method::POST, "/plan", None).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json(), json!({ "error": "No editorial strategy found" }));
    assert!(r.queue.all().is_empty());
}

#[tokio::test]
async fn daily_plan_appends_after_existing_jobs() {
    let r = rig(ScriptedPipeline::new());
    let last = Utc::now() + Duration::hours(30);
    r.queue.seed(last, JobStatus::Pending);

    let reply = authed(&r.router, Method::GET, "/cron/daily-plan", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["count"], 12);
    let pending = r.queue.with_status(JobStatus::Pending);
    assert_eq!(pending.len(), 13);
    assert!(pending.iter().filter(|j| j.scheduled_at != last).all(|j| j.scheduled_at > last));
}

#[tokio::test]
async fn idle_heartbeat_refills_an_empty_queue() {
    let r = rig(ScriptedPipeline::new());

    let reply = authed(&r.router, Method::GET, "/cron/heartbeat", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "outcome": "idle", "refilled": 12 }));
}

#[tokio::test]
async fn paused_heartbeat_does_nothing() {
    let strategy = EditorialStrategy {
        is_active: false,
        ..Default::default()
    };
    let r = rig_with(
        MockStrategyStore::with(strategy),
        ScriptedPipeline::new(),
        Arc::new(ScriptedPipeline::new()),
    );
    r.queue.seed(Utc::now() - Duration::hours(1), JobStatus::Pending);

    let reply = authed(&r.router, Method::GET, "/cron/heartbeat", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "outcome": "paused" }));
    assert_eq!(r.queue.all().len(), 1);
}

#[tokio::test]
async fn failing_heartbeat_reports_500_and_logs_attempt() {
    let r = rig(ScriptedPipeline::new().then_fail("boom"));
    let due = r.queue.seed(Utc::now() - Duration::hours(1), JobStatus::Pending);

    let reply = authed(&r.router, Method::GET, "/cron/heartbeat", None).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = reply.json();
    assert_eq!(body["outcome"], "retrying");
    assert_eq!(body["job_id"], due.to_string());
    assert_eq!(body["error"], "boom");
    assert_eq!(body["refilled"], 12);

    let logs = authed(&r.router, Method::GET, "/logs", None).await;
    assert_eq!(logs.status, StatusCode::OK);
    let entries = logs.json()["logs"].as_array().unwrap().clone();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["queue_job_id"], due.to_string());
    assert_eq!(entries[0]["result_summary"]["error"], "boom");
}

// =========================================================================
// Engine and media
// =========================================================================

fn engine_rig() -> (Harness, Rig) {
    let h = Harness::new("Harbor Reopens");
    let engine = Arc::new(Phantom::new(h.deps()));
    let r = rig_with(
        MockStrategyStore::with(EditorialStrategy::default()),
        ScriptedPipeline::new(),
        engine,
    );
    (h, r)
}

#[tokio::test]
async fn engine_generates_from_descriptor() {
    let (h, r) = engine_rig();

    let reply = authed(
        &r.router,
        Method::POST,
        "/engine/generate",
        Some(json!({ "mode": "MANUAL", "config": { "content_input": "The harbor reopened." } })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["title"], "Harbor Reopens");
    assert_eq!(body["author"], "Ada Quill");
    assert_eq!(body["tabloid_features"]["has_social"], true);
    assert_eq!(body["post_id"], h.articles.ids()[0].to_string());
}

#[tokio::test]
async fn engine_reports_pipeline_and_body_errors() {
    let mut h = Harness::new("Harbor Reopens");
    h.writer = Arc::new(MockWriter::failing());
    let r = rig_with(
        MockStrategyStore::with(EditorialStrategy::default()),
        ScriptedPipeline::new(),
        Arc::new(Phantom::new(h.deps())),
    );

    let failed = authed(
        &r.router,
        Method::POST,
        "/engine/generate",
        Some(json!({ "mode": "MANUAL", "config": { "content_input": "text" } })),
    )
    .await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(failed.json()["error"]
        .as_str()
        .unwrap()
        .contains("Failed to parse AI response"));

    let malformed = authed(
        &r.router,
        Method::POST,
        "/engine/generate",
        Some(json!({ "mode": "CARRIER_PIGEON" })),
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(malformed.json()["error"].is_string());
    assert!(h.articles.published().is_empty());
}

#[tokio::test]
async fn engine_answers_422_for_configuration_failures() {
    let mut h = Harness::new("Harbor Reopens");
    h.news = Arc::new(MockNews::missing_key());
    let r = rig_with(
        MockStrategyStore::with(EditorialStrategy::default()),
        ScriptedPipeline::new(),
        Arc::new(Phantom::new(h.deps())),
    );

    let no_text = authed(
        &r.router,
        Method::POST,
        "/engine/generate",
        Some(json!({ "mode": "MANUAL", "config": {} })),
    )
    .await;
    assert_eq!(no_text.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(no_text.json()["error"]
        .as_str()
        .unwrap()
        .contains("Content input required"));

    let no_key = authed(
        &r.router,
        Method::POST,
        "/engine/generate",
        Some(json!({ "mode": "NEWS_API_AI", "config": { "news_mode": "AUTOMATIC" } })),
    )
    .await;
    assert_eq!(no_key.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(no_key.json(), json!({ "error": "NEWSAPI_AI_KEY is not set" }));
}

#[tokio::test]
async fn remote_pipeline_keeps_configuration_failures_fatal() {
    let mut h = Harness::new("Harbor Reopens");
    h.news = Arc::new(MockNews::missing_key());
    let r = rig_with(
        MockStrategyStore::with(EditorialStrategy::default()),
        ScriptedPipeline::new(),
        Arc::new(Phantom::new(h.deps())),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = r.router.clone();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let remote = RemotePipeline::new(&format!("http://{addr}"), SECRET).unwrap();

    let job = JobDescriptor {
        mode: JobMode::NewsApiAi,
        config: JobConfig {
            news_mode: Some(NewsMode::Automatic),
            ..Default::default()
        },
    };
    let err = remote.generate(&job).await.unwrap_err();
    assert!(is_config_error(&err));
    assert!(err.to_string().contains("NEWSAPI_AI_KEY is not set"));

    let wrong_secret = RemotePipeline::new(&format!("http://{addr}"), "nope").unwrap();
    let err = wrong_secret.generate(&job).await.unwrap_err();
    assert!(!is_config_error(&err));
    assert!(err.to_string().contains("Engine error (401"));
}

#[tokio::test]
async fn media_serves_stored_bytes_publicly() {
    let r = rig(ScriptedPipeline::new());
    let id = r.media.seed("image/png", vec![1, 2, 3, 4]);

    let reply = send(&r.router, Method::GET, &format!("/media/{id}"), None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "image/png");
    assert!(reply.headers[header::CACHE_CONTROL]
        .to_str()
        .unwrap()
        .starts_with("public"));
    assert_eq!(&reply.body[..], &[1, 2, 3, 4]);

    let uri = format!("/media/{}", uuid::Uuid::new_v4());
    let unknown = send(&r.router, Method::GET, &uri, None, None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    let garbage = send(&r.router, Method::GET, "/media/not-a-uuid", None, None).await;
    assert_eq!(garbage.status, StatusCode::NOT_FOUND);
}
