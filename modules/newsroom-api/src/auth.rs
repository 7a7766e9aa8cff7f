use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::error::ApiError;
use crate::AppState;

/// Proof that the request carried the shared bearer secret. Extract this in
/// every admin, cron and engine handler.
pub struct CronAuth;

impl FromRequestParts<Arc<AppState>> for CronAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("");

        if !state.cron_secret.is_empty()
            && constant_time_eq(token.as_bytes(), state.cron_secret.as_bytes())
        {
            Ok(CronAuth)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
