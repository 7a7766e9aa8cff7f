use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use pulse::policy::RECENT_LOG_LIMIT;

use crate::auth::CronAuth;
use crate::error::ApiResult;
use crate::AppState;

pub async fn recent_logs(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let logs = state.audit.recent(RECENT_LOG_LIMIT).await?;
    Ok(Json(json!({ "success": true, "logs": logs })))
}
