//! Brings the newsroom database up to the current schema and exits.
//!
//! Needs only `DATABASE_URL`, so it can run ahead of a deploy before the cron
//! secret and provider keys are provisioned. The API binary applies the same
//! migrations on start.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Failed to connect to Postgres")?;

    newsroom_api::schema::migrate(&pool).await?;
    Ok(())
}
