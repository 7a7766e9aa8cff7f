//! Scheduling constants. The auto-refill threshold and the retry cadence are
//! tuned together; change them as a pair.

use chrono::Duration;

/// Auto-refill fires when the pending count is at or below this.
pub const LOW_WATER_MARK: u64 = 2;

/// A job is marked FAILED once this many attempts have failed.
pub const MAX_RETRIES: u32 = 3;

/// Due jobs executed per heartbeat. Kept at one so a single invocation fits
/// inside a hosted function's time limit.
pub const DUE_BATCH: usize = 1;

/// Admin queue view cap.
pub const ACTIVE_QUEUE_LIMIT: usize = 100;

/// Admin log view cap.
pub const RECENT_LOG_LIMIT: usize = 50;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Fixed, non-escalating delay before a failed job becomes due again.
pub fn retry_delay() -> Duration {
    Duration::minutes(15)
}

/// Spacing between consecutive jobs for a given daily throughput.
pub fn slot_interval(articles_per_day: u32) -> Duration {
    Duration::milliseconds(MS_PER_DAY / i64::from(articles_per_day.max(1)))
}
