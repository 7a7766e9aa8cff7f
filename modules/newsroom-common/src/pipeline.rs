use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::JobDescriptor;

/// What a successful generation run published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub post_id: Uuid,
    pub title: String,
    pub author: String,
    pub category: String,
    pub has_chart: bool,
    pub has_sidebar: bool,
    pub has_social: bool,
}

/// The content pipeline as seen by the scheduler: one all-or-nothing call.
/// Any error from any internal stage surfaces here as a failed run; there is
/// no resume-from-stage.
#[async_trait]
pub trait GenerationPipeline: Send + Sync {
    async fn generate(&self, job: &JobDescriptor) -> Result<GeneratedArticle>;
}
