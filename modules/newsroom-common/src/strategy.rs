//! Editorial strategy: the weighted-probability configuration the planner
//! draws from. A single strategy exists per deployment.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::NewsroomError;

// ---------------------------------------------------------------------------
// WeightTable
// ---------------------------------------------------------------------------

/// Category label → relative weight, in document order.
///
/// The selector scans entries in order and falls back to the first one, so
/// the order of the JSON object is part of the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(IndexMap<String, f64>);

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self(pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn first_label(&self) -> Option<&str> {
        self.0.first().map(|(k, _)| k.as_str())
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self, name: &str) -> Result<(), NewsroomError> {
        if self.is_empty() {
            return Err(NewsroomError::Validation(format!(
                "{name} must have at least one entry"
            )));
        }
        if let Some((label, w)) = self.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(NewsroomError::Validation(format!(
                "{name}.{label} must be a non-negative number (got {w})"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EditorialStrategy
// ---------------------------------------------------------------------------

/// One article a minute. Anything denser collapses the slot interval.
pub const MAX_ARTICLES_PER_DAY: u32 = 1440;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorialStrategy {
    pub is_active: bool,
    pub articles_per_day: u32,
    pub source_weights: WeightTable,
    pub image_weights: WeightTable,
    pub region_weights: WeightTable,
    pub sentiment_weights: WeightTable,
    pub complexity_weights: WeightTable,
    pub topic_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for EditorialStrategy {
    /// Seed strategy written on first read when no row exists.
    fn default() -> Self {
        Self {
            is_active: true,
            articles_per_day: 12,
            source_weights: WeightTable::from_pairs(&[
                ("rss", 40.0),
                ("news_api_automatic", 30.0),
                ("news_api_tailored", 30.0),
            ]),
            image_weights: WeightTable::from_pairs(&[("imagen", 50.0), ("unsplash", 50.0)]),
            region_weights: WeightTable::from_pairs(&[
                ("US", 40.0),
                ("Global", 25.0),
                ("IN", 20.0),
                ("UK", 15.0),
            ]),
            sentiment_weights: WeightTable::from_pairs(&[
                ("Objective", 50.0),
                ("Critical", 20.0),
                ("Investigative", 15.0),
                ("Supportive", 15.0),
            ]),
            complexity_weights: WeightTable::from_pairs(&[
                ("GENERAL", 60.0),
                ("EASY", 20.0),
                ("TECHNICAL", 20.0),
            ]),
            topic_list: vec![
                "Artificial Intelligence".to_string(),
                "Climate Technology".to_string(),
                "Semiconductors".to_string(),
                "Space Exploration".to_string(),
            ],
            updated_at: None,
        }
    }
}

impl EditorialStrategy {
    /// Check the invariants the planner relies on. Weight totals are not
    /// required to reach any particular sum.
    pub fn validate(&self) -> Result<(), NewsroomError> {
        if !(1..=MAX_ARTICLES_PER_DAY).contains(&self.articles_per_day) {
            return Err(NewsroomError::Validation(format!(
                "articles_per_day must be between 1 and {MAX_ARTICLES_PER_DAY} (got {})",
                self.articles_per_day
            )));
        }
        self.source_weights.validate("source_weights")?;
        self.image_weights.validate("image_weights")?;
        self.region_weights.validate("region_weights")?;
        self.sentiment_weights.validate("sentiment_weights")?;
        self.complexity_weights.validate("complexity_weights")?;
        Ok(())
    }

    /// Merge a partial update. Absent fields are left as they are.
    pub fn apply(&mut self, patch: StrategyPatch) {
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        if let Some(v) = patch.articles_per_day {
            self.articles_per_day = v;
        }
        if let Some(v) = patch.source_weights {
            self.source_weights = v;
        }
        if let Some(v) = patch.image_weights {
            self.image_weights = v;
        }
        if let Some(v) = patch.region_weights {
            self.region_weights = v;
        }
        if let Some(v) = patch.sentiment_weights {
            self.sentiment_weights = v;
        }
        if let Some(v) = patch.complexity_weights {
            self.complexity_weights = v;
        }
        if let Some(v) = patch.topic_list {
            self.topic_list = v;
        }
    }
}

/// Partial strategy body accepted by the admin save.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyPatch {
    pub is_active: Option<bool>,
    pub articles_per_day: Option<u32>,
    pub source_weights: Option<WeightTable>,
    pub image_weights: Option<WeightTable>,
    pub region_weights: Option<WeightTable>,
    pub sentiment_weights: Option<WeightTable>,
    pub complexity_weights: Option<WeightTable>,
    pub topic_list: Option<Vec<String>>,
}
