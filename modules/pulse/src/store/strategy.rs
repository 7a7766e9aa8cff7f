use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use newsroom_common::{EditorialStrategy, WeightTable};

use super::to_count;
use crate::error::{PulseError, Result};
use crate::traits::StrategyStore;

// Weight maps travel as text and live in JSON (not JSONB) columns so the
// document's key order survives the round trip.
const SELECT_STRATEGY: &str = r#"
    SELECT is_active, articles_per_day,
           source_weights::text, image_weights::text, region_weights::text,
           sentiment_weights::text, complexity_weights::text,
           topic_list, updated_at
    FROM pulse_config
    WHERE singleton
"#;

#[derive(sqlx::FromRow)]
struct StrategyRow {
    is_active: bool,
    articles_per_day: i32,
    source_weights: String,
    image_weights: String,
    region_weights: String,
    sentiment_weights: String,
    complexity_weights: String,
    topic_list: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StrategyRow> for EditorialStrategy {
    type Error = PulseError;

    fn try_from(row: StrategyRow) -> Result<Self> {
        Ok(EditorialStrategy {
            is_active: row.is_active,
            articles_per_day: to_count(row.articles_per_day, "articles_per_day")?,
            source_weights: parse_weights(&row.source_weights, "source_weights")?,
            image_weights: parse_weights(&row.image_weights, "image_weights")?,
            region_weights: parse_weights(&row.region_weights, "region_weights")?,
            sentiment_weights: parse_weights(&row.sentiment_weights, "sentiment_weights")?,
            complexity_weights: parse_weights(&row.complexity_weights, "complexity_weights")?,
            topic_list: row.topic_list,
            updated_at: Some(row.updated_at),
        })
    }
}

fn parse_weights(raw: &str, column: &str) -> Result<WeightTable> {
    serde_json::from_str(raw).map_err(|e| PulseError::Corrupt(format!("{column}: {e}")))
}

fn weights_text(table: &WeightTable) -> Result<String> {
    serde_json::to_string(table).map_err(|e| PulseError::Corrupt(e.to_string()))
}

/// The singleton `pulse_config` row.
#[derive(Clone)]
pub struct PgStrategyStore {
    pool: PgPool,
}

impl PgStrategyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StrategyStore for PgStrategyStore {
    async fn load(&self) -> Result<Option<EditorialStrategy>> {
        sqlx::query_as::<_, StrategyRow>(SELECT_STRATEGY)
            .fetch_optional(&self.pool)
            .await?
            .map(EditorialStrategy::try_from)
            .transpose()
    }

    async fn save(&self, strategy: &EditorialStrategy) -> Result<EditorialStrategy> {
        sqlx::query(
            r#"
            INSERT INTO pulse_config (
                singleton, is_active, articles_per_day,
                source_weights, image_weights, region_weights,
                sentiment_weights, complexity_weights, topic_list, updated_at
            )
            VALUES (TRUE, $1, $2, $3::json, $4::json, $5::json, $6::json, $7::json, $8, now())
            ON CONFLICT (singleton) DO UPDATE SET
                is_active = EXCLUDED.is_active,
                articles_per_day = EXCLUDED.articles_per_day,
                source_weights = EXCLUDED.source_weights,
                image_weights = EXCLUDED.image_weights,
                region_weights = EXCLUDED.region_weights,
                sentiment_weights = EXCLUDED.sentiment_weights,
                complexity_weights = EXCLUDED.complexity_weights,
                topic_list = EXCLUDED.topic_list,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(strategy.is_active)
        .bind(strategy.articles_per_day as i32)
        .bind(weights_text(&strategy.source_weights)?)
        .bind(weights_text(&strategy.image_weights)?)
        .bind(weights_text(&strategy.region_weights)?)
        .bind(weights_text(&strategy.sentiment_weights)?)
        .bind(weights_text(&strategy.complexity_weights)?)
        .bind(&strategy.topic_list)
        .execute(&self.pool)
        .await?;

        self.load()
            .await?
            .ok_or_else(|| PulseError::Corrupt("strategy row missing after save".to_string()))
    }
}
