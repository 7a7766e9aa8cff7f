use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tracing::{info, warn};

use newsroom_common::{JobDescriptor, NewsroomError};
use phantom::EngineResponse;

use crate::auth::CronAuth;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Run one job descriptor through the in-process engine. Configuration
/// failures answer 422 so a remote caller can skip its retries.
pub async fn generate(
    _auth: CronAuth,
    State(state): State<Arc<AppState>>,
    body: Result<Json<JobDescriptor>, JsonRejection>,
) -> ApiResult<Json<EngineResponse>> {
    let Json(job) = body?;
    info!(mode = %job.mode, "Engine: generation requested");

    match state.engine.generate(&job).await {
        Ok(article) => Ok(Json(article.into())),
        Err(e) => {
            warn!(mode = %job.mode, error = %format!("{e:#}"), "Engine: generation failed");
            match config_message(&e) {
                Some(message) => Err(ApiError::Unprocessable(message)),
                None => Err(ApiError::Internal(format!("{e:#}"))),
            }
        }
    }
}

fn config_message(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| match cause.downcast_ref::<NewsroomError>() {
        Some(NewsroomError::Config(message)) => Some(message.clone()),
        _ => None,
    })
}
