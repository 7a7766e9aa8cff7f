//! Client for a Phantom engine running on another host.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use newsroom_common::{GeneratedArticle, GenerationPipeline, JobDescriptor, NewsroomError};

/// Generation can take minutes when several image tiers are tried.
const ENGINE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabloidFeatures {
    pub has_sidebar: bool,
    pub has_social: bool,
}

/// Body of a successful `POST /engine/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub success: bool,
    pub post_id: Uuid,
    pub title: String,
    pub author: String,
    pub category: String,
    pub has_chart: bool,
    #[serde(default)]
    pub tabloid_features: TabloidFeatures,
}

impl From<GeneratedArticle> for EngineResponse {
    fn from(a: GeneratedArticle) -> Self {
        Self {
            success: true,
            post_id: a.post_id,
            title: a.title,
            author: a.author,
            category: a.category,
            has_chart: a.has_chart,
            tabloid_features: TabloidFeatures {
                has_sidebar: a.has_sidebar,
                has_social: a.has_social,
            },
        }
    }
}

impl From<EngineResponse> for GeneratedArticle {
    fn from(r: EngineResponse) -> Self {
        Self {
            post_id: r.post_id,
            title: r.title,
            author: r.author,
            category: r.category,
            has_chart: r.has_chart,
            has_sidebar: r.tabloid_features.has_sidebar,
            has_social: r.tabloid_features.has_social,
        }
    }
}

#[derive(Deserialize)]
struct EngineError {
    error: Option<String>,
}

pub struct RemotePipeline {
    http: reqwest::Client,
    endpoint: String,
    secret: String,
}

impl RemotePipeline {
    pub fn new(base_url: &str, secret: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(ENGINE_TIMEOUT)
            .build()
            .context("Failed to build engine HTTP client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/engine/generate", base_url.trim_end_matches('/')),
            secret: secret.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationPipeline for RemotePipeline {
    async fn generate(&self, job: &JobDescriptor) -> anyhow::Result<GeneratedArticle> {
        debug!(endpoint = %self.endpoint, mode = %job.mode, "Calling remote engine");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.secret)
            .json(job)
            .send()
            .await
            .context("Engine request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<EngineError>(&text)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or(text);
            // The engine answers 422 when its own configuration is at fault.
            if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
                return Err(NewsroomError::Config(message).into());
            }
            return Err(anyhow!("Engine error ({}): {}", status, message));
        }

        let body: EngineResponse = response.json().await.context("Malformed engine response")?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let remote = RemotePipeline::new("https://engine.example.com/", "s").unwrap();
        assert_eq!(remote.endpoint(), "https://engine.example.com/engine/generate");
    }

    #[test]
    fn response_shape_carries_tabloid_flags() {
        let article = GeneratedArticle {
            post_id: Uuid::nil(),
            title: "Harbor reopens".into(),
            author: "Ada Quill".into(),
            category: "Local".into(),
            has_chart: true,
            has_sidebar: false,
            has_social: true,
        };
        let json = serde_json::to_value(EngineResponse::from(article.clone())).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["tabloid_features"]["has_social"], true);
        assert_eq!(json["tabloid_features"]["has_sidebar"], false);

        let back: EngineResponse = serde_json::from_value(json).unwrap();
        assert_eq!(GeneratedArticle::from(back), article);
    }
}
