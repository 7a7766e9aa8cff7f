use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use newsroom_common::StrategyPatch;

use crate::auth::CronAuth;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Current strategy, seeded with defaults on first read.
pub async fn get_strategy(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let strategy = state.strategies.load_or_seed().await?;
    Ok(Json(json!({ "success": true, "config": strategy })))
}

/// Merge a partial strategy into the stored one. Last write wins.
pub async fn save_strategy(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
    body: Result<Json<StrategyPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(patch) = body?;

    let mut strategy = state.strategies.load_or_seed().await?;
    strategy.apply(patch);
    strategy
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let saved = state.strategies.save(&strategy).await?;
    info!(
        is_active = saved.is_active,
        articles_per_day = saved.articles_per_day,
        "Strategy saved"
    );
    Ok(Json(json!({ "success": true, "config": saved })))
}
