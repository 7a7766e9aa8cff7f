//! In-process alternative to the external heartbeat cron.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use pulse::Heartbeat;

/// Beat every `every`, one invocation at a time. A slow run delays the next
/// tick instead of stacking invocations.
pub fn spawn(heartbeat: Arc<Heartbeat>, every: Duration) -> JoinHandle<()> {
    info!(every_secs = every.as_secs(), "Starting in-process heartbeat ticker");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match heartbeat.beat().await {
                Ok(report) => match serde_json::to_string(&report) {
                    Ok(summary) => info!(report = %summary, "Ticker: heartbeat done"),
                    Err(_) => info!("Ticker: heartbeat done"),
                },
                Err(e) => error!(error = %e, "Ticker: heartbeat failed"),
            }
        }
    })
}
