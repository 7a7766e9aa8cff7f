use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::rest;
use crate::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(rest::health))
        // Admin
        .route(
            "/strategy",
            get(rest::strategy::get_strategy).post(rest::strategy::save_strategy),
        )
        .route(
            "/queue",
            get(rest::queue::list_queue)
                .patch(rest::queue::update_job)
                .delete(rest::queue::delete_job),
        )
        .route("/queue/run", post(rest::queue::run_job))
        .route("/logs", get(rest::logs::recent_logs))
        .route("/plan", post(rest::plan::regenerate))
        // Cron triggers
        .route("/cron/daily-plan", get(rest::cron::daily_plan))
        .route("/cron/heartbeat", get(rest::cron::heartbeat))
        // Engine
        .route("/engine/generate", post(rest::engine::generate))
        .route("/media/{id}", get(rest::media::serve_media))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Admin and cron responses are never cached; media sets its own.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method and path only; query strings may carry ids.
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
