use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::warn;

use crate::traits::StockPhotos;

const UNSPLASH_ENDPOINT: &str = "https://api.unsplash.com/search/photos";

/// Curated static images, the chain's last resort.
pub const FALLBACK_IMAGES: &[&str] = &[
    "https://images.unsplash.com/photo-1486718448742-163732cd1544?w=1200&q=80",
    "https://images.unsplash.com/photo-1518770660439-4636190af475?w=1200&q=80",
    "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?w=1200&q=80",
    "https://images.unsplash.com/photo-1565610222536-ef125c59da2c?w=1200&q=80",
    "https://images.unsplash.com/photo-1529101091760-61df51603096?w=1200&q=80",
    "https://images.unsplash.com/photo-1517457373958-b7bdd4587205?w=1200&q=80",
];

pub fn fallback_image<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FALLBACK_IMAGES
        .choose(rng)
        .copied()
        .unwrap_or(FALLBACK_IMAGES[0])
}

pub struct UnsplashClient {
    access_key: Option<String>,
    http: reqwest::Client,
    endpoint: String,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            access_key,
            http: reqwest::Client::new(),
            endpoint: UNSPLASH_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[async_trait]
impl StockPhotos for UnsplashClient {
    async fn search(&self, query: &str) -> Result<Option<String>> {
        let Some(access_key) = self.access_key.as_deref() else {
            warn!("UNSPLASH_ACCESS_KEY not set, skipping stock tier");
            return Ok(None);
        };

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("query", query), ("orientation", "landscape"), ("per_page", "1")])
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {access_key}"))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Unsplash API error ({}): {}", status, error_text));
        }

        let data: SearchResponse = response.json().await?;
        let url = data.results.into_iter().next().map(|p| p.urls.regular);
        if url.is_none() {
            warn!(query, "Unsplash found no images");
        }
        Ok(url)
    }
}
