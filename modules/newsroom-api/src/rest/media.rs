use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Stored AI image bytes. Public: the rendered site links here directly.
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let not_found = || ApiError::NotFound("Media not found".to_string());
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    let media = state
        .media
        .load(id)
        .await
        .map_err(|e| ApiError::Internal(format!("{e:#}")))?
        .ok_or_else(not_found)?;

    Ok((
        [
            (header::CONTENT_TYPE, media.content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        media.bytes,
    )
        .into_response())
}
