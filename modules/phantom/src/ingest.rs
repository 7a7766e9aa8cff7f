//! Source ingestion: turns a descriptor's source fields into prompt context.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use tracing::info;

use newsroom_common::{JobDescriptor, JobMode, NewsMode};

use crate::error::{PhantomError, Result};
use crate::traits::{FeedFetcher, FeedItem, NewsQuery, NewsSource};

/// Feed items considered per run.
pub const RSS_ITEM_LIMIT: usize = 15;

/// Context is cut to this many characters before prompting.
pub const MAX_CONTEXT_CHARS: usize = 10_000;

pub const MANUAL_SOURCE: &str = "Manual Input";

#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub context: String,
    pub source_url: String,
    /// Image supplied by the source itself; always wins for the cover.
    pub source_image: Option<String>,
}

pub struct Ingestor {
    feeds: Arc<dyn FeedFetcher>,
    news: Arc<dyn NewsSource>,
}

impl Ingestor {
    pub fn new(feeds: Arc<dyn FeedFetcher>, news: Arc<dyn NewsSource>) -> Self {
        Self { feeds, news }
    }

    pub async fn ingest(&self, job: &JobDescriptor) -> Result<Ingested> {
        let config = &job.config;
        match job.mode {
            JobMode::Manual => {
                let text = non_empty(config.content_input.as_deref())
                    .ok_or(PhantomError::MissingInput("Content input required for Manual mode"))?;
                Ok(Ingested {
                    context: truncate_chars(text, MAX_CONTEXT_CHARS).to_string(),
                    source_url: MANUAL_SOURCE.to_string(),
                    source_image: None,
                })
            }
            JobMode::SpecificRss => {
                let url = non_empty(config.rss_url.as_deref())
                    .ok_or(PhantomError::MissingInput("RSS URL required"))?;
                let items = self.feeds.fetch_items(url, RSS_ITEM_LIMIT).await?;
                let fetched = items.len();
                let matching = filter_items(items, config.topic_search.as_deref());

                let item = {
                    let mut rng = rand::rng();
                    matching.choose(&mut rng).cloned()
                }
                .ok_or_else(|| {
                    PhantomError::NoSource("No RSS items found matching criteria".to_string())
                })?;

                info!(url, fetched, matching = matching.len(), picked = %item.title, "RSS item selected");
                let context = format!("Headline: {}. Snippet: {}", item.title, item.snippet);
                Ok(Ingested {
                    context: truncate_chars(&context, MAX_CONTEXT_CHARS).to_string(),
                    source_url: item.link,
                    source_image: None,
                })
            }
            JobMode::NewsApiAi => {
                let query = NewsQuery {
                    mode: config.news_mode.unwrap_or(NewsMode::Automatic),
                    region: config.target_region.clone(),
                    category: config.news_category.clone(),
                    topic: config.news_topic.clone(),
                };
                let article = self.news.latest(&query).await?.ok_or_else(|| {
                    PhantomError::NoSource("News API found no articles in stream".to_string())
                })?;

                info!(title = %article.title, source = %article.source, "News article selected");
                let context = format!(
                    "Headline: {}\nSource: {}\n\n{}",
                    article.title, article.source, article.body
                );
                Ok(Ingested {
                    context: truncate_chars(&context, MAX_CONTEXT_CHARS).to_string(),
                    source_url: article.url,
                    source_image: article.image.filter(|i| !i.trim().is_empty()),
                })
            }
        }
    }
}

/// Keep items whose title or snippet contains `topic`, case-insensitively.
/// No topic keeps everything.
pub fn filter_items(items: Vec<FeedItem>, topic: Option<&str>) -> Vec<FeedItem> {
    let Some(term) = non_empty(topic).map(str::to_lowercase) else {
        return items;
    };
    items
        .into_iter()
        .filter(|i| {
            i.title.to_lowercase().contains(&term) || i.snippet.to_lowercase().contains(&term)
        })
        .collect()
}

/// At most `max` characters, never splitting one.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, snippet: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.len()),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn filter_matches_title_or_snippet_ignoring_case() {
        let items = vec![
            item("Rust 2.0 Announced", ""),
            item("Weather", "a RUSTY old bridge"),
            item("Sports", "nothing here"),
        ];
        let kept = filter_items(items, Some("rust"));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn blank_topic_keeps_everything() {
        let items = vec![item("A", ""), item("B", "")];
        assert_eq!(filter_items(items.clone(), None).len(), 2);
        assert_eq!(filter_items(items, Some("  ")).len(), 2);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars(&"x".repeat(12_000), MAX_CONTEXT_CHARS).len(), 10_000);
    }
}
