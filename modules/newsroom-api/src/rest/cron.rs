use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::info;

use pulse::HeartbeatOutcome;

use crate::auth::CronAuth;
use crate::error::ApiResult;
use crate::AppState;

/// Daily top-up: append one day of jobs after the last pending one.
pub async fn daily_plan(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    info!("Daily plan: generating schedule for the next 24 hours");
    let count = state.planner().generate_schedule(false).await?;
    Ok(Json(json!({
        "success": true,
        "count": count,
        "message": format!("Daily Plan Executed. Added {count} jobs to the queue."),
    })))
}

/// One heartbeat. A failed run answers 500 so the trigger's own alerting
/// sees it; the job itself has already been rescheduled or failed.
pub async fn heartbeat(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let report = state.heartbeat.beat().await?;
    let status = match report.outcome {
        HeartbeatOutcome::Retrying { .. } | HeartbeatOutcome::Failed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::OK,
    };
    Ok((status, Json(report)).into_response())
}
