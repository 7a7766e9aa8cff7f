//! Postgres persistence for published articles and AI image bytes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::traits::{
    ArticleStore, GeneratedImage, ImageStorage, NewPost, PublishedPost, StoredMedia,
};

/// Slug plus the last four digits of the current epoch milliseconds, so
/// regenerated headlines don't collide.
pub fn unique_slug(base: &str, epoch_millis: i64) -> String {
    format!("{base}-{:04}", epoch_millis.rem_euclid(10_000))
}

#[derive(Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn publish(&self, post: &NewPost) -> Result<PublishedPost> {
        let draft = &post.draft;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO authors (id, name, role, bio, is_ai)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&draft.author_name)
        .bind(&draft.author_role)
        .bind(format!("Reporting from {}.", post.region))
        .execute(&mut *tx)
        .await
        .context("Failed to create author")?;

        let author_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM authors WHERE name = $1")
                .bind(&draft.author_name)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to look up author")?;

        let post_id = Uuid::new_v4();
        let slug = unique_slug(&draft.slug, Utc::now().timestamp_millis());

        sqlx::query(
            r#"
            INSERT INTO posts (
                id, title, slug, excerpt, content, author_id, category,
                featured_image, source_url, generation_mode,
                nut_graph, public_sentiment, sidebar_content, meta_description,
                social_text, alt_headlines, chart_data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(post_id)
        .bind(&draft.title)
        .bind(&slug)
        .bind(&draft.excerpt)
        .bind(&post.content)
        .bind(author_id)
        .bind(&draft.category)
        .bind(&post.cover.url)
        .bind(&post.source_url)
        .bind(&post.generation_mode)
        .bind(&draft.nut_graph)
        .bind(&draft.public_sentiment)
        .bind(draft.sidebar_content.as_ref().map(Json))
        .bind(&draft.meta_description)
        .bind(&draft.social_text)
        .bind(&draft.alt_headlines)
        .bind(draft.chart_data.as_ref().map(Json))
        .execute(&mut *tx)
        .await
        .context("Failed to insert post")?;

        let images = std::iter::once(&post.cover).chain(post.inline_images.iter());
        for (position, image) in images.enumerate() {
            sqlx::query(
                r#"
                INSERT INTO article_images (id, post_id, url, source, keyword, is_cover, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(post_id)
            .bind(&image.url)
            .bind(image.tier.as_str())
            .bind(&image.keyword)
            .bind(image.is_cover)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .context("Failed to insert image metadata")?;
        }

        tx.commit().await?;
        Ok(PublishedPost { post_id, slug })
    }
}

/// Stores AI image bytes in `article_media`, served by the API's media route.
#[derive(Clone)]
pub struct PgImageStorage {
    pool: PgPool,
    public_base_url: String,
}

impl PgImageStorage {
    pub fn new(pool: PgPool, public_base_url: &str) -> Self {
        Self {
            pool,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn media_url(&self, id: Uuid) -> String {
        format!("{}/media/{id}", self.public_base_url)
    }
}

#[async_trait]
impl ImageStorage for PgImageStorage {
    async fn store(&self, image: GeneratedImage) -> Result<String> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO article_media (id, content_type, bytes) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&image.content_type)
            .bind(&image.bytes)
            .execute(&self.pool)
            .await
            .context("Failed to store image bytes")?;
        Ok(self.media_url(id))
    }

    async fn load(&self, id: Uuid) -> Result<Option<StoredMedia>> {
        let row = sqlx::query_as::<_, (String, Vec<u8>)>(
            "SELECT content_type, bytes FROM article_media WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(content_type, bytes)| StoredMedia {
            id,
            content_type,
            bytes,
        }))
    }
}
