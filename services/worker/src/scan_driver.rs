//! Scan round driver
//!
//! One round: claim a batch, resolve items one at a time, flush partial
//! results once the round has run past the flush threshold, submit the rest
//! at the end. Rounds repeat until the shutdown token is cancelled.

use shared::errors::ServiceError;
use shared::PriceObservation;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};

use crate::config::WorkerConfig;
use crate::coordinator_client::WorkCoordinator;
use crate::pricing::{scan_time_now, PriceResolver, Resolution};

/// Counters for one round
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub acquired: usize,
    pub observed: usize,
    pub missed: usize,
    pub no_pool: usize,
    pub submissions: usize,
}

pub struct ScanDriver {
    coordinator: Arc<dyn WorkCoordinator>,
    resolver: Arc<dyn PriceResolver>,
    config: WorkerConfig,
}

impl ScanDriver {
    pub fn new(
        coordinator: Arc<dyn WorkCoordinator>,
        resolver: Arc<dyn PriceResolver>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            coordinator,
            resolver,
            config,
        }
    }

    /// Run rounds until `shutdown` is cancelled. A round that has started
    /// always runs to completion, final submission included.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            worker_id = %self.config.worker_id,
            strategy = self.resolver.strategy(),
            batch_size = self.config.batch_size,
            item_delay_ms = self.config.item_delay_ms,
            round_delay_ms = self.config.round_delay_ms,
            "Scan driver starting"
        );

        let mut round: u64 = 1;

        while !shutdown.is_cancelled() {
            let summary = self.run_round(round).await;

            if summary.acquired > 0 {
                info!(
                    round,
                    acquired = summary.acquired,
                    observed = summary.observed,
                    missed = summary.missed,
                    no_pool = summary.no_pool,
                    submissions = summary.submissions,
                    "Round completed"
                );
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.config.round_delay()) => {}
            }

            round += 1;
        }

        info!(rounds = round, "Scan driver stopped");
    }

    pub async fn run_round(&self, round: u64) -> RoundSummary {
        let span = tracing::info_span!("scan_round", round);
        self.scan(round).instrument(span).await
    }

    async fn scan(&self, round: u64) -> RoundSummary {
        let mut summary = RoundSummary::default();
        metrics::counter!("worker_rounds_total").increment(1);

        // One wall-clock stamp per round, shared by every result it submits
        let scan_time = scan_time_now();

        let items = self
            .coordinator
            .acquire(&self.config.worker_id, self.config.batch_size)
            .await;
        summary.acquired = items.len();

        if items.is_empty() {
            debug!(round, "No work items assigned");
            return summary;
        }

        let start = Instant::now();
        let flush_after = self.config.flush_after();
        let mut pending: Vec<PriceObservation> = Vec::new();

        for item in &items {
            match self.resolver.resolve(item).await {
                Resolution::Observation(mut observation) => {
                    observation.scan_time = scan_time.clone();
                    summary.observed += 1;
                    metrics::counter!("worker_observations_total").increment(1);
                    debug!(mint = %item.mint, price = observation.price, unit = %observation.unit, "Price resolved");
                    pending.push(observation);
                }
                Resolution::NoObservation => {
                    summary.missed += 1;
                    metrics::counter!("worker_price_misses_total").increment(1);
                    let report = ServiceError::no_price(&item.mint);
                    error!(mint = %item.mint, code = %report.code, "{}", report.message);
                }
                Resolution::NoPool => {
                    summary.no_pool += 1;
                    metrics::counter!("worker_no_pool_total").increment(1);
                    let report = ServiceError::no_pool(&item.mint);
                    debug!(mint = %item.mint, code = %report.code, "{}", report.message);
                }
            }

            // Measured from round start: once past the threshold every
            // non-empty pending list is flushed.
            if start.elapsed() > flush_after && !pending.is_empty() {
                debug!(
                    round,
                    count = pending.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Flushing partial results"
                );
                self.flush(&mut pending, &mut summary).await;
            }

            sleep(self.config.item_delay()).await;
        }

        if !pending.is_empty() {
            self.flush(&mut pending, &mut summary).await;
        }

        metrics::histogram!("worker_round_duration_seconds").record(start.elapsed().as_secs_f64());
        summary
    }

    async fn flush(&self, pending: &mut Vec<PriceObservation>, summary: &mut RoundSummary) {
        self.coordinator.submit(pending).await;
        summary.submissions += 1;
        pending.clear();
    }
}
