use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use newsroom_common::{JobDescriptor, JobPatch};
use pulse::policy::ACTIVE_QUEUE_LIMIT;
use pulse::HeartbeatOutcome;

use super::require_id;
use crate::auth::CronAuth;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Deserialize)]
pub struct PatchBody {
    id: Option<String>,
    scheduled_at: Option<DateTime<Utc>>,
    job_params: Option<JobDescriptor>,
}

#[derive(Deserialize)]
pub struct IdQuery {
    id: Option<String>,
}

#[derive(Deserialize)]
pub struct RunBody {
    id: Option<String>,
}

/// Non-terminal jobs, earliest first.
pub async fn list_queue(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let jobs = state.queue.list_active(ACTIVE_QUEUE_LIMIT).await?;
    Ok(Json(json!({ "success": true, "queue": jobs })))
}

pub async fn update_job(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
    body: Result<Json<PatchBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let id = require_id(body.id.as_deref(), "Missing ID")?;
    let patch = JobPatch {
        scheduled_at: body.scheduled_at,
        job_params: body.job_params,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let job = state
        .queue
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Job not found or no longer pending".to_string()))?;

    info!(job_id = %id, scheduled_at = %job.scheduled_at, "Queue job edited");
    Ok(Json(json!({ "success": true, "job": job })))
}

/// Hard cancel of a PENDING job.
pub async fn delete_job(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = require_id(query.id.as_deref(), "Missing ID")?;

    if !state.queue.delete(id).await? {
        return Err(ApiError::NotFound(
            "Job not found or no longer pending".to_string(),
        ));
    }

    info!(job_id = %id, "Queue job cancelled");
    Ok(Json(json!({ "success": true })))
}

/// Out-of-band execution of one job through the heartbeat's claim, finalize
/// and retry path, ignoring its scheduled time.
pub async fn run_job(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
    body: Result<Json<RunBody>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body?;
    let id = require_id(body.id.as_deref(), "Missing Job ID")?;

    info!(job_id = %id, "Manual run requested");
    let outcome = state.heartbeat.run_now(id).await?;

    let status = match &outcome {
        HeartbeatOutcome::AlreadyClaimed { .. } => {
            return Err(ApiError::NotFound(
                "Job not found or already processing".to_string(),
            ))
        }
        HeartbeatOutcome::Retrying { .. } | HeartbeatOutcome::Failed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome)).into_response())
}
