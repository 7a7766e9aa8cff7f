// Test mocks for the generation pipeline.
//
// One in-memory mock per provider trait. Each records what it was asked for
// so tests can assert on the calls as well as the result. `Harness` wires a
// full set into `PhantomDeps`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use newsroom_common::{JobConfig, NewsroomError};

use crate::draft::ArticleDraft;
use crate::pipeline::PhantomDeps;
use crate::traits::{
    ArticleStore, FeedFetcher, FeedItem, GeneratedImage, ImageGenerator, ImageStorage, NewPost,
    NewsArticle, NewsQuery, NewsSource, PublishedPost, StockPhotos, StoredMedia, TextWriter,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A normalized draft with two inline placeholders.
pub fn sample_draft(title: &str) -> ArticleDraft {
    ArticleDraft {
        author_name: "Ada Quill".to_string(),
        author_role: "Harbor Correspondent".to_string(),
        title: title.to_string(),
        alt_headlines: vec!["One".into(), "Two".into(), "Three".into()],
        category: "Local".to_string(),
        excerpt: "Short excerpt.".to_string(),
        content: "Lead paragraph.\n\n[IMAGE: cargo cranes]\n\nMiddle.\n\n[IMAGE: night shift]\n\nEnd."
            .to_string(),
        social_text: Some("Read this".to_string()),
        image_keywords: Some("harbor at dawn".to_string()),
        ..Default::default()
    }
    .normalize()
}

pub fn feed_item(title: &str, snippet: &str) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        link: format!("https://feeds.example.com/{}", crate::draft::slugify(title)),
        snippet: snippet.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockFeeds
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockFeeds {
    feeds: Mutex<HashMap<String, Vec<FeedItem>>>,
    calls: Mutex<Vec<String>>,
}

impl MockFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(self, url: &str, items: Vec<FeedItem>) -> Self {
        self.feeds.lock().unwrap().insert(url.to_string(), items);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetcher for MockFeeds {
    async fn fetch_items(&self, url: &str, limit: usize) -> Result<Vec<FeedItem>> {
        self.calls.lock().unwrap().push(url.to_string());
        let feeds = self.feeds.lock().unwrap();
        let items = feeds
            .get(url)
            .ok_or_else(|| anyhow!("Feed fetch failed for {url}: 404"))?;
        Ok(items.iter().take(limit).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MockNews
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockNews {
    article: Option<NewsArticle>,
    missing_key: bool,
    queries: Mutex<Vec<NewsQuery>>,
}

impl MockNews {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_article(article: NewsArticle) -> Self {
        Self {
            article: Some(article),
            ..Default::default()
        }
    }

    /// Behaves like a client with no API key.
    pub fn missing_key() -> Self {
        Self {
            missing_key: true,
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<NewsQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsSource for MockNews {
    async fn latest(&self, query: &NewsQuery) -> Result<Option<NewsArticle>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.missing_key {
            return Err(NewsroomError::Config("NEWSAPI_AI_KEY is not set".to_string()).into());
        }
        Ok(self.article.clone())
    }
}

// ---------------------------------------------------------------------------
// MockWriter
// ---------------------------------------------------------------------------

pub struct MockWriter {
    draft: Option<ArticleDraft>,
    contexts: Mutex<Vec<String>>,
}

impl MockWriter {
    pub fn returning(draft: ArticleDraft) -> Self {
        Self {
            draft: Some(draft),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call, like a model returning unparseable output.
    pub fn failing() -> Self {
        Self {
            draft: None,
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextWriter for MockWriter {
    async fn write(&self, context: &str, _config: &JobConfig) -> Result<ArticleDraft> {
        self.contexts.lock().unwrap().push(context.to_string());
        self.draft
            .clone()
            .ok_or_else(|| anyhow!("Failed to parse AI response as JSON"))
    }
}

// ---------------------------------------------------------------------------
// Image tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierBehavior {
    /// Returns an image.
    Hit,
    /// Returns nothing (no key, no match).
    Empty,
    /// The call errors.
    Fail,
}

pub struct MockImageGenerator {
    behavior: TierBehavior,
    prompts: Mutex<Vec<String>>,
}

impl MockImageGenerator {
    pub fn new(behavior: TierBehavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.behavior {
            TierBehavior::Hit => Ok(Some(GeneratedImage {
                bytes: vec![0x89, b'P', b'N', b'G'],
                content_type: "image/png".to_string(),
            })),
            TierBehavior::Empty => Ok(None),
            TierBehavior::Fail => Err(anyhow!("Imagen API error (500): boom")),
        }
    }
}

pub struct MockStockPhotos {
    behavior: TierBehavior,
    queries: Mutex<Vec<String>>,
}

impl MockStockPhotos {
    pub fn new(behavior: TierBehavior) -> Self {
        Self {
            behavior,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn url_for(query: &str) -> String {
        format!("https://stock.example.com/{}", crate::draft::slugify(query))
    }
}

#[async_trait]
impl StockPhotos for MockStockPhotos {
    async fn search(&self, query: &str) -> Result<Option<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        match self.behavior {
            TierBehavior::Hit => Ok(Some(Self::url_for(query))),
            TierBehavior::Empty => Ok(None),
            TierBehavior::Fail => Err(anyhow!("Unsplash API error (403): rate limited")),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryImageStorage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryImageStorage {
    media: Mutex<Vec<StoredMedia>>,
}

impl MemoryImageStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<StoredMedia> {
        self.media.lock().unwrap().clone()
    }

    pub fn url_for(id: Uuid) -> String {
        format!("http://localhost:3000/media/{id}")
    }

    /// Insert bytes directly. Returns the id.
    pub fn seed(&self, content_type: &str, bytes: Vec<u8>) -> Uuid {
        let id = Uuid::new_v4();
        self.media.lock().unwrap().push(StoredMedia {
            id,
            content_type: content_type.to_string(),
            bytes,
        });
        id
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn store(&self, image: GeneratedImage) -> Result<String> {
        let id = self.seed(&image.content_type, image.bytes);
        Ok(Self::url_for(id))
    }

    async fn load(&self, id: Uuid) -> Result<Option<StoredMedia>> {
        Ok(self
            .media
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// MockArticleStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockArticleStore {
    posts: Mutex<Vec<(PublishedPost, NewPost)>>,
    failing: bool,
}

impl MockArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<NewPost> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.post_id)
            .collect()
    }
}

#[async_trait]
impl ArticleStore for MockArticleStore {
    async fn publish(&self, post: &NewPost) -> Result<PublishedPost> {
        if self.failing {
            return Err(anyhow!("Failed to insert post"));
        }
        let published = PublishedPost {
            post_id: Uuid::new_v4(),
            slug: format!("{}-0001", post.draft.slug),
        };
        self.posts
            .lock()
            .unwrap()
            .push((published.clone(), post.clone()));
        Ok(published)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A full mock provider set. Fields are public so tests can swap one mock
/// before calling [`Harness::deps`].
pub struct Harness {
    pub feeds: Arc<MockFeeds>,
    pub news: Arc<MockNews>,
    pub writer: Arc<MockWriter>,
    pub generator: Arc<MockImageGenerator>,
    pub stock: Arc<MockStockPhotos>,
    pub storage: Arc<MemoryImageStorage>,
    pub articles: Arc<MockArticleStore>,
}

impl Harness {
    /// Writer returns `sample_draft(title)`, both image tiers hit.
    pub fn new(title: &str) -> Self {
        Self {
            feeds: Arc::new(MockFeeds::new()),
            news: Arc::new(MockNews::empty()),
            writer: Arc::new(MockWriter::returning(sample_draft(title))),
            generator: Arc::new(MockImageGenerator::new(TierBehavior::Hit)),
            stock: Arc::new(MockStockPhotos::new(TierBehavior::Hit)),
            storage: Arc::new(MemoryImageStorage::new()),
            articles: Arc::new(MockArticleStore::new()),
        }
    }

    pub fn deps(&self) -> PhantomDeps {
        PhantomDeps::builder()
            .feeds(self.feeds.clone())
            .news(self.news.clone())
            .writer(self.writer.clone())
            .generator(self.generator.clone())
            .stock(self.stock.clone())
            .storage(self.storage.clone())
            .articles(self.articles.clone())
            .build()
    }
}
