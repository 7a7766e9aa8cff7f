use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsroom_api::{build_router, ticker, AppState};
use newsroom_common::{Config, GenerationPipeline};
use phantom::{PgImageStorage, Phantom, PhantomDeps, RemotePipeline};
use pulse::store::{PgAuditLog, PgQueueStore, PgStrategyStore};

#[derive(Parser)]
#[command(name = "newsroom-api", about = "Newsroom scheduler and engine API")]
struct Cli {
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "API_PORT", default_value_t = 3000)]
    port: u16,

    /// Run the heartbeat in-process every N minutes instead of relying on an
    /// external cron.
    #[arg(long, env = "PULSE_TICK_MINUTES")]
    tick_minutes: Option<u64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    newsroom_api::schema::migrate(&pool).await?;

    let engine: Arc<dyn GenerationPipeline> =
        Arc::new(Phantom::new(PhantomDeps::from_config(&config, pool.clone())?));

    let pipeline: Arc<dyn GenerationPipeline> = match &config.phantom_url {
        Some(url) => {
            let remote = RemotePipeline::new(url, config.cron_secret.clone())?;
            info!(endpoint = remote.endpoint(), "Heartbeat uses remote engine");
            Arc::new(remote)
        }
        None => engine.clone(),
    };

    let state = Arc::new(AppState::new(
        Arc::new(PgQueueStore::new(pool.clone())),
        Arc::new(PgStrategyStore::new(pool.clone())),
        Arc::new(PgAuditLog::new(pool.clone())),
        pipeline,
        engine,
        Arc::new(PgImageStorage::new(pool, &config.public_base_url)),
        config.cron_secret.clone(),
    ));

    if let Some(minutes) = cli.tick_minutes.filter(|m| *m > 0) {
        ticker::spawn(state.heartbeat.clone(), Duration::from_secs(minutes * 60));
    }

    let app = build_router(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    info!("Newsroom API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
