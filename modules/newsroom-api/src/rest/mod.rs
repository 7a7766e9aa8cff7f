pub mod cron;
pub mod engine;
pub mod logs;
pub mod media;
pub mod plan;
pub mod queue;
pub mod strategy;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

// --- Helpers ---

/// Admin bodies carry ids as strings; absent or blank is a 400 with
/// `missing`, unparseable is a 400 too.
fn require_id(raw: Option<&str>, missing: &str) -> ApiResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(missing.to_string()))?;
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid ID: {raw}")))
}

pub async fn health() -> &'static str {
    "ok"
}
