//! Gemini text writer. One `generateContent` call in JSON response mode
//! produces the whole structured draft.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use newsroom_common::{Complexity, JobConfig, NewsroomError};

use crate::draft::ArticleDraft;
use crate::error::PhantomError;
use crate::ingest::{truncate_chars, MAX_CONTEXT_CHARS};
use crate::traits::TextWriter;

const GEMINI_TEXT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

const PUBLICATION: &str = "The Newsroom";

const DEFAULT_LAYOUT: &str = r#"
    - Start with a "Nut Graph" (Why this matters).
    - Use a "Key Takeaways" bullet list.
    - Main Analysis (Broken into subsections).
    - "Public Sentiment" section (Synthesized quotes).
    - Conclusion."#;

pub struct GeminiWriter {
    api_key: Option<String>,
    http: reqwest::Client,
    endpoint: String,
}

impl GeminiWriter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
            endpoint: GEMINI_TEXT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }
}

fn complexity_label(complexity: Complexity) -> &'static str {
    match complexity {
        Complexity::Easy => "EASY (Grade 8)",
        Complexity::General => "GENERAL (broadsheet style)",
        Complexity::Technical => "TECHNICAL (academic)",
    }
}

/// Build the writer prompt. Unset tone and structure fields get the writer's
/// defaults: 800 words, Global, Objective, GENERAL.
pub fn build_prompt(context: &str, config: &JobConfig) -> String {
    let word_count = config.word_count.unwrap_or(800);
    let region = config.target_region.as_deref().unwrap_or("Global");
    let sentiment = config.article_sentiment.as_deref().unwrap_or("Objective");
    let complexity = complexity_label(config.complexity.unwrap_or_default());
    let layout = config
        .layout_instructions
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(DEFAULT_LAYOUT);
    let context = truncate_chars(context, MAX_CONTEXT_CHARS);

    let direction = match config.thought_direction.as_deref() {
        Some(d) if !d.trim().is_empty() => format!("\n    - Editorial Direction: {d}"),
        _ => String::new(),
    };
    let sidebar = if config.include_sidebar == Some(false) {
        "Return null for sidebar_content."
    } else {
        "Create a \"Fast Facts\" or \"Timeline\" sidebar box."
    };
    let social = if config.generate_social == Some(false) {
        "Return null for meta_description and social_text."
    } else {
        "Write a search meta description and a viral social post."
    };

    format!(
        r#"
    You are a senior editor for "{PUBLICATION}", a digital newspaper.

    SOURCE CONTEXT:
    "{context}"

    CONFIGURATION:
    - Region/Persona: {region}
    - Word Count: ~{word_count} words
    - Sentiment: {sentiment}
    - Reading Level: {complexity}{direction}

    MANDATORY INSTRUCTIONS:
    1. Persona: Create a fictional author name and role based on the region.
    2. Headlines: A catchy but accurate main headline plus 3 alternative headlines.
    3. Nut Graph: A "Why it matters" paragraph explaining the impact of the story.
    4. Public Sentiment: Summarize the public mood on this topic. Do not invent quotes from real people.
    5. Sidebar: {sidebar}
    6. SEO/Social: {social}
    7. Visuals: Insert exactly 2 placeholders in the markdown body where an image fits, formatted as [IMAGE: search keyword].
       If the context contains numerical data, produce a chart (BAR, LINE or PIE). Otherwise return null for chart_data.

    LAYOUT INSTRUCTIONS:
    {layout}

    Output Format: JSON ONLY.

    JSON SCHEMA:
    {{
      "author_name": "String",
      "author_role": "String",
      "title": "String",
      "alt_headlines": ["String", "String", "String"],
      "slug": "kebab-case-string",
      "category": "String (single word, e.g. 'Politics')",
      "excerpt": "String (2 sentences)",
      "nut_graph": "String",
      "public_sentiment": "String",
      "content": "Markdown with [IMAGE: keyword] placeholders",
      "sidebar_content": {{ "title": "String", "items": ["String"] }} | null,
      "meta_description": "String" | null,
      "social_text": "String" | null,
      "image_keywords": "String (search query for the cover image)",
      "chart_data": {{ "type": "BAR" | "PIE" | "LINE", "title": "String", "data": [{{ "label": "String", "value": Number }}] }} | null
    }}
"#
    )
}

/// Strip markdown code fences the model sometimes wraps JSON in.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

pub fn parse_draft(raw: &str) -> Result<ArticleDraft, PhantomError> {
    serde_json::from_str::<ArticleDraft>(strip_code_blocks(raw))
        .map(ArticleDraft::normalize)
        .map_err(|e| PhantomError::MalformedDraft(e.to_string()))
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[async_trait]
impl TextWriter for GeminiWriter {
    async fn write(&self, context: &str, config: &JobConfig) -> Result<ArticleDraft> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| NewsroomError::Config("GEMINI_API_KEY is not set".to_string()))?;

        let prompt = build_prompt(context, config);
        debug!(chars = prompt.len(), "Gemini generateContent request");

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
                "generationConfig": { "responseMimeType": "application/json" }
            }))
            .send()
            .await
            .context("Gemini request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let data: GenerateResponse = response.json().await?;
        let text = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| anyhow!("Gemini produced no text"))?;

        parse_draft(&text).map_err(|e| {
            warn!(raw = %truncate_chars(&text, 500), "Gemini returned unparseable JSON");
            anyhow::Error::new(e)
        })
    }
}
