// Provider seams for the generation pipeline.
//
// Every third-party call sits behind one narrow trait so the pipeline can be
// driven end to end with the mocks in `testing`: no network, no database.
// Providers that can come back empty-handed return `Ok(None)`; `Err` means
// the call itself failed.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use newsroom_common::{JobConfig, NewsMode};

use crate::draft::ArticleDraft;

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// The first `limit` items of the feed, in feed order.
    async fn fetch_items(&self, url: &str, limit: usize) -> Result<Vec<FeedItem>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub mode: NewsMode,
    pub region: Option<String>,
    pub category: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub body: String,
    pub url: String,
    pub source: String,
    pub image: Option<String>,
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn latest(&self, query: &NewsQuery) -> Result<Option<NewsArticle>>;
}

// ---------------------------------------------------------------------------
// Text synthesis
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TextWriter: Send + Sync {
    async fn write(&self, context: &str, config: &JobConfig) -> Result<ArticleDraft>;
}

// ---------------------------------------------------------------------------
// Visuals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>>;
}

#[async_trait]
pub trait StockPhotos: Send + Sync {
    /// URL of the best match for `query`.
    async fn search(&self, query: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    pub id: Uuid,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Persist image bytes and return a public URL.
    async fn store(&self, image: GeneratedImage) -> Result<String>;

    async fn load(&self, id: Uuid) -> Result<Option<StoredMedia>>;
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTier {
    Source,
    Imagen,
    Unsplash,
    Fallback,
}

impl ImageTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageTier::Source => "source",
            ImageTier::Imagen => "imagen",
            ImageTier::Unsplash => "unsplash",
            ImageTier::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub url: String,
    pub tier: ImageTier,
    pub keyword: Option<String>,
    pub is_cover: bool,
}

/// A fully resolved article ready to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub draft: ArticleDraft,
    /// Body with placeholders replaced.
    pub content: String,
    pub cover: ImageAsset,
    pub inline_images: Vec<ImageAsset>,
    pub source_url: String,
    pub generation_mode: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPost {
    pub post_id: Uuid,
    pub slug: String,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Find-or-create the author, insert the post and its image rows.
    async fn publish(&self, post: &NewPost) -> Result<PublishedPost>;
}
