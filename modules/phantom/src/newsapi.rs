//! Event Registry minute-stream client.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use newsroom_common::{NewsMode, NewsroomError};

use crate::traits::{NewsArticle, NewsQuery, NewsSource};

const EVENT_REGISTRY_ENDPOINT: &str = "https://eventregistry.org/api/v1/minuteStreamArticles";

/// Topic searches look back 48h; category browsing only 24h.
const TAILORED_WINDOW_MINS: u32 = 2880;
const AUTOMATIC_WINDOW_MINS: u32 = 1440;

/// Region label to Event Registry source-location URI. `Global` and unknown
/// regions apply no location filter.
pub fn region_uri(region: &str) -> Option<&'static str> {
    match region {
        "US" => Some("http://en.wikipedia.org/wiki/United_States"),
        "IN" => Some("http://en.wikipedia.org/wiki/India"),
        "UK" => Some("http://en.wikipedia.org/wiki/United_Kingdom"),
        "JP" => Some("http://en.wikipedia.org/wiki/Japan"),
        "EU" => Some("http://en.wikipedia.org/wiki/Europe"),
        _ => None,
    }
}

/// Category label to DMOZ category URI.
pub fn category_uri(category: &str) -> Option<&'static str> {
    match category {
        "Business" => Some("dmoz/Business"),
        "Technology" => Some("dmoz/Computers"),
        "Science" => Some("dmoz/Science"),
        "Health" => Some("dmoz/Health"),
        "Politics" => Some("dmoz/Society/Politics"),
        "Entertainment" => Some("dmoz/Arts/Entertainment"),
        "Sports" => Some("dmoz/Sports"),
        _ => None,
    }
}

pub struct EventRegistryClient {
    api_key: Option<String>,
    http: reqwest::Client,
    endpoint: String,
}

impl EventRegistryClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
            endpoint: EVENT_REGISTRY_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }
}

/// Request body for one minute-stream query. Tailored mode without a topic
/// degrades to automatic browsing.
pub fn build_request(api_key: &str, query: &NewsQuery) -> Value {
    let mut body = json!({
        "apiKey": api_key,
        "articleBodyLen": -1,
        "includeArticleImage": true,
        "includeArticleConcepts": true,
        "includeSourceTitle": true,
        "recentActivityArticlesMaxArticleCount": 50,
        "lang": ["eng"],
        "isDuplicateFilter": "skipDuplicates",
        "hasBody": true,
    });

    let topic = query.topic.as_deref().filter(|t| !t.trim().is_empty());
    match (query.mode, topic) {
        (NewsMode::Tailored, Some(topic)) => {
            body["recentActivityArticlesUpdatesAfterMinsAgo"] = json!(TAILORED_WINDOW_MINS);
            body["keyword"] = json!(topic);
            body["keywordOper"] = json!("or");
            body["keywordLoc"] = json!("title");
        }
        _ => {
            body["recentActivityArticlesUpdatesAfterMinsAgo"] = json!(AUTOMATIC_WINDOW_MINS);
            if let Some(uri) = query.region.as_deref().and_then(region_uri) {
                body["sourceLocationUri"] = json!([uri]);
            }
            if let Some(uri) = query.category.as_deref().and_then(category_uri) {
                body["categoryUri"] = json!([uri]);
            }
        }
    }

    body
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(rename = "recentActivityArticles")]
    recent: Option<StreamActivity>,
}

#[derive(Deserialize)]
struct StreamActivity {
    #[serde(default)]
    activity: Vec<StreamArticle>,
}

#[derive(Deserialize)]
struct StreamArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    url: String,
    source: Option<StreamSource>,
    image: Option<String>,
}

#[derive(Deserialize)]
struct StreamSource {
    title: Option<String>,
}

#[async_trait]
impl NewsSource for EventRegistryClient {
    async fn latest(&self, query: &NewsQuery) -> Result<Option<NewsArticle>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| NewsroomError::Config("NEWSAPI_AI_KEY is not set".to_string()))?;

        info!(mode = ?query.mode, "Calling Event Registry");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&build_request(api_key, query))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Event Registry error ({}): {}", status, error_text));
        }

        let data: StreamResponse = response.json().await?;
        // The stream is newest first.
        let Some(article) = data.recent.and_then(|r| r.activity.into_iter().next()) else {
            warn!("Event Registry returned no articles");
            return Ok(None);
        };

        Ok(Some(NewsArticle {
            title: article.title,
            body: article.body,
            url: article.url,
            source: article
                .source
                .and_then(|s| s.title)
                .unwrap_or_else(|| "News Wire".to_string()),
            image: article.image,
        }))
    }
}
