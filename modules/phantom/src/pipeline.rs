use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use typed_builder::TypedBuilder;

use newsroom_common::{Config, GeneratedArticle, GenerationPipeline, JobDescriptor, NewsroomError};

use crate::error::{PhantomError, Result};
use crate::feed::FeedService;
use crate::imagen::ImagenClient;
use crate::ingest::Ingestor;
use crate::newsapi::EventRegistryClient;
use crate::store::{PgArticleStore, PgImageStorage};
use crate::traits::{
    ArticleStore, FeedFetcher, ImageGenerator, ImageStorage, NewPost, NewsSource, StockPhotos,
    TextWriter,
};
use crate::unsplash::UnsplashClient;
use crate::visuals::VisualResolver;
use crate::writer::GeminiWriter;

/// Provider set the pipeline runs against.
#[derive(Clone, TypedBuilder)]
pub struct PhantomDeps {
    pub feeds: Arc<dyn FeedFetcher>,
    pub news: Arc<dyn NewsSource>,
    pub writer: Arc<dyn TextWriter>,
    pub generator: Arc<dyn ImageGenerator>,
    pub stock: Arc<dyn StockPhotos>,
    pub storage: Arc<dyn ImageStorage>,
    pub articles: Arc<dyn ArticleStore>,
}

impl PhantomDeps {
    /// Production providers. Missing provider keys surface when the provider
    /// is first used, not here.
    pub fn from_config(config: &Config, pool: PgPool) -> anyhow::Result<Self> {
        Ok(Self::builder()
            .feeds(Arc::new(FeedService::new()?))
            .news(Arc::new(EventRegistryClient::new(config.newsapi_ai_key.clone())))
            .writer(Arc::new(GeminiWriter::new(config.gemini_api_key.clone())))
            .generator(Arc::new(ImagenClient::new(config.gemini_api_key.clone())))
            .stock(Arc::new(UnsplashClient::new(config.unsplash_access_key.clone())))
            .storage(Arc::new(PgImageStorage::new(
                pool.clone(),
                &config.public_base_url,
            )))
            .articles(Arc::new(PgArticleStore::new(pool)))
            .build())
    }
}

/// Ingest, write, illustrate, publish. All or nothing: the first failing
/// stage fails the run and nothing is resumed.
pub struct Phantom {
    ingestor: Ingestor,
    writer: Arc<dyn TextWriter>,
    visuals: VisualResolver,
    articles: Arc<dyn ArticleStore>,
}

impl Phantom {
    pub fn new(deps: PhantomDeps) -> Self {
        Self {
            ingestor: Ingestor::new(deps.feeds, deps.news),
            writer: deps.writer,
            visuals: VisualResolver::new(deps.generator, deps.stock, deps.storage),
            articles: deps.articles,
        }
    }

    pub async fn run(&self, job: &JobDescriptor) -> Result<GeneratedArticle> {
        let config = &job.config;

        let ingested = self.ingestor.ingest(job).await?;
        info!(mode = %job.mode, source = %ingested.source_url, "Phantom: source ingested");

        let draft = self.writer.write(&ingested.context, config).await?;
        info!(title = %draft.title, author = %draft.author_name, "Phantom: draft written");

        let visuals = self
            .visuals
            .resolve_article(
                &draft,
                config.preferred_image_source.as_deref(),
                ingested.source_image.as_deref(),
            )
            .await;

        let post = NewPost {
            content: visuals.content,
            cover: visuals.cover,
            inline_images: visuals.inline,
            source_url: ingested.source_url,
            generation_mode: job.mode.as_str().to_string(),
            region: config
                .target_region
                .clone()
                .unwrap_or_else(|| "Global".to_string()),
            draft,
        };
        let published = self.articles.publish(&post).await?;
        info!(post_id = %published.post_id, slug = %published.slug, "Phantom: article published");

        let draft = post.draft;
        Ok(GeneratedArticle {
            post_id: published.post_id,
            title: draft.title,
            author: draft.author_name,
            category: draft.category,
            has_chart: draft.chart_data.is_some(),
            has_sidebar: draft.sidebar_content.is_some(),
            has_social: draft.social_text.is_some(),
        })
    }
}

#[async_trait]
impl GenerationPipeline for Phantom {
    async fn generate(&self, job: &JobDescriptor) -> anyhow::Result<GeneratedArticle> {
        match self.run(job).await {
            Ok(article) => Ok(article),
            // Provider errors keep their own cause chain.
            Err(PhantomError::Other(e)) => Err(e),
            Err(e) if e.is_config() => Err(NewsroomError::Config(e.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }
}
