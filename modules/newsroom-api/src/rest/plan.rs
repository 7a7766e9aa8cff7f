use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::CronAuth;
use crate::error::ApiResult;
use crate::AppState;

/// Regenerate: drop every PENDING job and plan a fresh day.
pub async fn regenerate(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let count = state.planner().generate_schedule(true).await?;
    info!(count, "Schedule regenerated");
    Ok(Json(json!({
        "success": true,
        "count": count,
        "message": format!("Scheduled {count} jobs for the next 24 hours."),
    })))
}
