use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

use newsroom_common::{EditorialStrategy, NewJob};

use crate::descriptor::{build_descriptor, DrawnParams};
use crate::error::{PulseError, Result};
use crate::policy::slot_interval;
use crate::selector::pick;
use crate::traits::{QueueStore, StrategyStore};

/// Converts the editorial strategy into a day's worth of evenly spaced jobs.
#[derive(Clone)]
pub struct Planner {
    queue: Arc<dyn QueueStore>,
    strategies: Arc<dyn StrategyStore>,
}

impl Planner {
    pub fn new(queue: Arc<dyn QueueStore>, strategies: Arc<dyn StrategyStore>) -> Self {
        Self { queue, strategies }
    }

    /// Plan one day of jobs. `clear_existing = false` appends after the last
    /// pending job (daily top-up); `true` drops all pending jobs and rebuilds
    /// from now. Returns the number of jobs enqueued.
    pub async fn generate_schedule(&self, clear_existing: bool) -> Result<usize> {
        self.generate_schedule_at(clear_existing, Utc::now()).await
    }

    pub async fn generate_schedule_at(
        &self,
        clear_existing: bool,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let strategy = self
            .strategies
            .load()
            .await?
            .ok_or(PulseError::StrategyMissing)?;
        strategy.validate()?;

        if clear_existing {
            let cleared = self.queue.clear_pending().await?;
            info!(cleared, "Planner: cleared pending jobs");
        }

        let anchor = if clear_existing {
            now
        } else {
            self.queue.latest_pending_at().await?.unwrap_or(now)
        };

        let jobs = {
            let mut rng = rand::rng();
            plan_batch(&strategy, anchor, &mut rng)?
        };

        let inserted = self.queue.enqueue(jobs).await?;
        info!(
            jobs = inserted.len(),
            anchor = %anchor,
            articles_per_day = strategy.articles_per_day,
            clear_existing,
            "Planner: schedule generated"
        );

        Ok(inserted.len())
    }
}

/// Build `articles_per_day` jobs, the first one interval after `anchor` and
/// each subsequent one a further interval later. Pure given the RNG.
pub fn plan_batch<R: Rng + ?Sized>(
    strategy: &EditorialStrategy,
    anchor: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<NewJob>> {
    let interval = slot_interval(strategy.articles_per_day);
    let mut next_run = anchor;
    let mut jobs = Vec::with_capacity(strategy.articles_per_day as usize);

    for _ in 0..strategy.articles_per_day {
        next_run += interval;

        let drawn = DrawnParams {
            source_mode: draw(&strategy.source_weights, "source_weights", rng)?,
            image_source: draw(&strategy.image_weights, "image_weights", rng)?,
            region: draw(&strategy.region_weights, "region_weights", rng)?,
            sentiment: draw(&strategy.sentiment_weights, "sentiment_weights", rng)?,
        };

        jobs.push(NewJob {
            scheduled_at: next_run,
            job_params: build_descriptor(&drawn, strategy, rng),
        });
    }

    Ok(jobs)
}

fn draw<R: Rng + ?Sized>(
    weights: &newsroom_common::WeightTable,
    name: &'static str,
    rng: &mut R,
) -> Result<String> {
    pick(weights, rng)
        .map(str::to_string)
        .ok_or(PulseError::EmptyWeights(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use newsroom_common::{JobMode, WeightTable};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn batch_is_evenly_spaced_after_anchor() {
        let strategy = EditorialStrategy::default();
        let mut rng = StdRng::seed_from_u64(1);

        let jobs = plan_batch(&strategy, t0(), &mut rng).unwrap();

        assert_eq!(jobs.len(), 12);
        assert!(jobs[0].scheduled_at > t0());
        assert_eq!(jobs[0].scheduled_at - t0(), Duration::hours(2));
        for pair in jobs.windows(2) {
            assert_eq!(
                (pair[1].scheduled_at - pair[0].scheduled_at).num_milliseconds(),
                7_200_000
            );
        }
    }

    #[test]
    fn single_label_weights_are_deterministic() {
        let mut strategy = EditorialStrategy::default();
        strategy.articles_per_day = 3;
        strategy.source_weights = WeightTable::from_pairs(&[("rss", 100.0)]);
        strategy.region_weights = WeightTable::from_pairs(&[("JP", 1.0)]);
        let mut rng = StdRng::seed_from_u64(9);

        let jobs = plan_batch(&strategy, t0(), &mut rng).unwrap();

        assert!(jobs.iter().all(|j| j.job_params.mode == JobMode::SpecificRss));
        assert!(jobs
            .iter()
            .all(|j| j.job_params.config.target_region.as_deref() == Some("JP")));
    }

    #[test]
    fn empty_weights_fail_the_batch() {
        let mut strategy = EditorialStrategy::default();
        strategy.image_weights = WeightTable::new();
        let mut rng = StdRng::seed_from_u64(9);

        let err = plan_batch(&strategy, t0(), &mut rng).unwrap_err();
        assert!(matches!(err, PulseError::EmptyWeights("image_weights")));
    }
}
