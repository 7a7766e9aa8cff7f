//! The structured article the writer returns, before visuals are resolved.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

pub const DEFAULT_AUTHOR: &str = "Newsroom Staff";
pub const DEFAULT_AUTHOR_ROLE: &str = "Contributor";
pub const DEFAULT_CATEGORY: &str = "Dispatches";
pub const DEFAULT_TITLE: &str = "Untitled Report";

/// Model output is loosely typed. A `null` in a plain field reads as the
/// default and an unreadable chart is dropped, so only a broken document or
/// a missing body fails the draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDraft {
    #[serde(deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author_role: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alt_headlines: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub excerpt: String,
    pub nut_graph: Option<String>,
    pub public_sentiment: Option<String>,
    /// Markdown body with `[IMAGE: keyword]` placeholders.
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "lenient")]
    pub sidebar_content: Option<Sidebar>,
    pub meta_description: Option<String>,
    pub social_text: Option<String>,
    /// Search query for the cover image.
    pub image_keywords: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub chart_data: Option<ChartData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sidebar {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChartType {
    Bar,
    Pie,
    Line,
}

impl<'de> Deserialize<'de> for ChartType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_uppercase().as_str() {
            "BAR" => Ok(ChartType::Bar),
            "PIE" => Ok(ChartType::Pie),
            "LINE" => Ok(ChartType::Line),
            _ => Err(D::Error::unknown_variant(&raw, &["BAR", "PIE", "LINE"])),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    #[serde(deserialize_with = "label_text")]
    pub label: String,
    /// Accepts `12.5`, `"12.5"`, `"12%"` and `"1,200"`.
    #[serde(deserialize_with = "numeric")]
    pub value: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Optional nested objects: anything that does not fit becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(error = %e, "Dropping unreadable draft section");
            Ok(None)
        }
    }
}

fn label_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

fn numeric<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("{n} is not a finite number"))),
        serde_json::Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect();
            digits
                .parse()
                .map_err(|_| D::Error::custom(format!("{s:?} is not a number")))
        }
        other => Err(D::Error::custom(format!("{other} is not a number"))),
    }
}

impl ArticleDraft {
    /// Fill the fields persistence cannot do without. The model is asked for
    /// all of them but does not always comply.
    pub fn normalize(mut self) -> Self {
        if self.author_name.trim().is_empty() {
            self.author_name = DEFAULT_AUTHOR.to_string();
        }
        if self.author_role.trim().is_empty() {
            self.author_role = DEFAULT_AUTHOR_ROLE.to_string();
        }
        if self.title.trim().is_empty() {
            self.title = DEFAULT_TITLE.to_string();
        }
        // Single word, no slashes.
        self.category = self
            .category
            .split(['/', ','])
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        } else {
            self.slug = slugify(&self.slug);
        }
        if self.chart_data.as_ref().is_some_and(|c| c.data.is_empty()) {
            self.chart_data = None;
        }
        self
    }
}

/// Lowercase kebab-case with only ASCII alphanumerics.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "article".to_string()
    } else {
        slug
    }
}
