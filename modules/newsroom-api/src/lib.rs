//! HTTP surface for the newsroom: admin and cron endpoints over the Pulse
//! scheduler, the Phantom engine endpoint and the media route.

pub mod auth;
pub mod error;
pub mod rest;
pub mod routes;
pub mod schema;
pub mod ticker;

use std::sync::Arc;

use newsroom_common::GenerationPipeline;
use phantom::traits::ImageStorage;
use pulse::{AuditLog, Heartbeat, Planner, QueueStore, StrategyStore};

pub use routes::build_router;

pub struct AppState {
    pub heartbeat: Arc<Heartbeat>,
    pub queue: Arc<dyn QueueStore>,
    pub strategies: Arc<dyn StrategyStore>,
    pub audit: Arc<dyn AuditLog>,
    /// The in-process engine behind `/engine/generate`. The heartbeat may
    /// use a remote one instead.
    pub engine: Arc<dyn GenerationPipeline>,
    pub media: Arc<dyn ImageStorage>,
    pub cron_secret: String,
}

impl AppState {
    /// `pipeline` is what the heartbeat runs jobs through.
    pub fn new(
        queue: Arc<dyn QueueStore>,
        strategies: Arc<dyn StrategyStore>,
        audit: Arc<dyn AuditLog>,
        pipeline: Arc<dyn GenerationPipeline>,
        engine: Arc<dyn GenerationPipeline>,
        media: Arc<dyn ImageStorage>,
        cron_secret: impl Into<String>,
    ) -> Self {
        let heartbeat = Arc::new(Heartbeat::new(
            queue.clone(),
            strategies.clone(),
            audit.clone(),
            pipeline,
        ));
        Self {
            heartbeat,
            queue,
            strategies,
            audit,
            engine,
            media,
            cron_secret: cron_secret.into(),
        }
    }

    pub fn planner(&self) -> &Planner {
        self.heartbeat.planner()
    }
}
