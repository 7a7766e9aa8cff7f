//! Database schema for the scheduler tables and the article store, embedded
//! from the workspace `migrations/` directory.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply any pending migrations. Safe to run on every start.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.iter().count(), "Database schema is current");
    Ok(())
}
