// RSS/Atom feed fetcher.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::traits::{FeedFetcher, FeedItem};

// Some publishers reject non-browser agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "application/rss+xml, application/xml, text/xml; q=0.1";

pub struct FeedService {
    client: reqwest::Client,
}

impl FeedService {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build RSS HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for FeedService {
    async fn fetch_items(&self, url: &str, limit: usize) -> Result<Vec<FeedItem>> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await
            .context("RSS feed fetch failed")?
            .error_for_status()
            .context("RSS feed returned an error status")?;

        let bytes = resp.bytes().await.context("Failed to read RSS feed body")?;
        let items = parse_items(&bytes, limit)?;

        info!(url, items = items.len(), "feed: parsed successfully");
        Ok(items)
    }
}

/// Parse a feed document into its first `limit` entries.
pub fn parse_items(bytes: &[u8], limit: usize) -> Result<Vec<FeedItem>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;

    Ok(feed
        .entries
        .into_iter()
        .take(limit)
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let snippet = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            FeedItem {
                title: entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_else(|| "Untitled".to_string()),
                link,
                snippet,
            }
        })
        .collect())
}
