use std::env;

use crate::error::NewsroomError;

/// Application configuration loaded from environment variables.
/// Holds secrets and env-specific values only; listen address and the
/// optional ticker cadence are CLI flags on the server binary.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Shared bearer secret for the admin and cron surface
    pub cron_secret: String,

    // Providers
    pub gemini_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
    pub newsapi_ai_key: Option<String>,

    // Remote engine. When set, the heartbeat posts jobs here instead of
    // running the pipeline in-process.
    pub phantom_url: Option<String>,

    // Prefix for URLs of images stored in our own media table.
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, NewsroomError> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: required_env("DATABASE_URL")?,
            cron_secret: required_env("CRON_SECRET")?,
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            unsplash_access_key: optional_env("UNSPLASH_ACCESS_KEY"),
            newsapi_ai_key: optional_env("NEWSAPI_AI_KEY"),
            phantom_url: optional_env("PHANTOM_URL"),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{head}...({} chars)", val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => preview(v),
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  CRON_SECRET: {}", preview(&self.cron_secret));
        tracing::info!("  GEMINI_API_KEY: {}", preview_opt(&self.gemini_api_key));
        tracing::info!("  UNSPLASH_ACCESS_KEY: {}", preview_opt(&self.unsplash_access_key));
        tracing::info!("  NEWSAPI_AI_KEY: {}", preview_opt(&self.newsapi_ai_key));
        tracing::info!(
            "  PHANTOM_URL: {}",
            self.phantom_url.as_deref().unwrap_or("<in-process>")
        );
    }
}

fn required_env(key: &str) -> Result<String, NewsroomError> {
    optional_env(key)
        .ok_or_else(|| NewsroomError::Config(format!("{key} environment variable is required")))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
