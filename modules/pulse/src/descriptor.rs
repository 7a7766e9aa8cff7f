//! Job descriptor builder: turns one slot's drawn parameters into the exact,
//! self-contained payload the generation pipeline will receive.

use rand::seq::IndexedRandom;
use rand::Rng;

use newsroom_common::{
    Complexity, EditorialStrategy, JobConfig, JobDescriptor, JobMode, NewsMode,
};

/// Source-mode labels with special meaning in `source_weights`. Any other
/// label falls through to a random feed from [`RSS_FEEDS`].
pub const SOURCE_NEWS_TAILORED: &str = "news_api_tailored";
pub const SOURCE_NEWS_AUTOMATIC: &str = "news_api_automatic";

pub const RSS_FEEDS: &[&str] = &[
    "https://www.theverge.com/rss/index.xml",
    "https://hackaday.com/blog/feed/",
    "https://techcrunch.com/feed/",
];

pub const NEWS_CATEGORIES: &[&str] = &["Technology", "Business", "Science", "Politics"];

/// Used when the strategy's topic list is empty.
pub const DEFAULT_TOPIC: &str = "Technology";

pub const DEFAULT_WORD_COUNT: u32 = 800;

/// One slot's independent weighted draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnParams {
    pub source_mode: String,
    pub region: String,
    pub sentiment: String,
    pub image_source: String,
}

pub fn build_descriptor<R: Rng + ?Sized>(
    drawn: &DrawnParams,
    strategy: &EditorialStrategy,
    rng: &mut R,
) -> JobDescriptor {
    let mut config = JobConfig {
        target_region: Some(drawn.region.clone()),
        article_sentiment: Some(drawn.sentiment.clone()),
        word_count: Some(DEFAULT_WORD_COUNT),
        complexity: Some(Complexity::General),
        include_sidebar: Some(true),
        generate_social: Some(true),
        ..Default::default()
    };

    let mode = match drawn.source_mode.as_str() {
        SOURCE_NEWS_TAILORED => {
            let topic = strategy
                .topic_list
                .choose(rng)
                .map(String::as_str)
                .unwrap_or(DEFAULT_TOPIC);
            config.news_mode = Some(NewsMode::Tailored);
            config.news_topic = Some(topic.to_string());
            JobMode::NewsApiAi
        }
        SOURCE_NEWS_AUTOMATIC => {
            let category = NEWS_CATEGORIES.choose(rng).copied().unwrap_or(DEFAULT_TOPIC);
            config.news_mode = Some(NewsMode::Automatic);
            config.news_category = Some(category.to_string());
            JobMode::NewsApiAi
        }
        _ => {
            let feed = RSS_FEEDS.choose(rng).copied().unwrap_or(RSS_FEEDS[0]);
            config.rss_url = Some(feed.to_string());
            JobMode::SpecificRss
        }
    };

    config.preferred_image_source = Some(drawn.image_source.clone());

    JobDescriptor { mode, config }
}
