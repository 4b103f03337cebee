//! One full round against a fake coordinator, with error-level log capture.
//! Kept as the only test in this binary so the scoped subscriber sees every
//! event.

mod common;

use async_trait::async_trait;
use common::{AssignReply, FakeCoordinator};
use price_worker::pricing::{PriceResolver, Resolution};
use price_worker::{CoordinatorClient, ScanDriver, WorkerConfig};
use serde_json::json;
use shared::{PriceObservation, PriceSource, WorkItem};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// Collects the `mint` field of every error-level event from the worker crate
#[derive(Clone, Default)]
struct ErrorCapture(Arc<Mutex<Vec<String>>>);

struct MintField(Option<String>);

impl Visit for MintField {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "mint" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for ErrorCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != Level::ERROR || !metadata.target().starts_with("price_worker") {
            return;
        }

        let mut mint = MintField(None);
        event.record(&mut mint);
        self.0.lock().unwrap().push(mint.0.unwrap_or_default());
    }
}

/// Prices `mint-1`, finds no pool for `mint-3`, misses everything else
struct OneHit;

#[async_trait]
impl PriceResolver for OneHit {
    async fn resolve(&self, item: &WorkItem) -> Resolution {
        match item.mint.as_str() {
            "mint-1" => {}
            "mint-3" => return Resolution::NoPool,
            _ => return Resolution::NoObservation,
        }

        Resolution::Observation(PriceObservation {
            mint: item.mint.clone(),
            index: item.index,
            price: 0.000123,
            unit: "SOL".to_string(),
            source: PriceSource::Onchain,
            supply: Some(1_000_000.0),
            pool_address: Some("PoolAccount".to_string()),
            top_holders: None,
            timestamp: 1_700_000_000,
            scan_time: "12:00:00".to_string(),
        })
    }

    fn strategy(&self) -> &'static str {
        "onchain"
    }
}

#[tokio::test]
async fn test_round_submits_hits_and_logs_errors_only_for_misses() {
    let captured = ErrorCapture::default();
    let _guard = tracing_subscriber::registry()
        .with(captured.clone())
        .set_default();

    let coordinator = FakeCoordinator::start(vec![AssignReply::Json(json!([
        {"mint": "mint-1", "index": "1"},
        {"mint": "mint-2", "index": 2},
        {"mint": "mint-3", "index": 3}
    ]))])
    .await;

    let client = CoordinatorClient::new(coordinator.base_url.clone(), Duration::from_secs(5)).unwrap();
    let config = WorkerConfig {
        worker_id: "webcon_test".to_string(),
        batch_size: 5,
        item_delay_ms: 10,
        round_delay_ms: 10,
        flush_after_ms: 25_000,
        shutdown_grace_seconds: 1,
    };
    let driver = ScanDriver::new(Arc::new(client), Arc::new(OneHit), config);

    let summary = driver.run_round(1).await;
    assert_eq!(summary.acquired, 3);
    assert_eq!(summary.observed, 1);
    assert_eq!(summary.missed, 1);
    assert_eq!(summary.no_pool, 1);
    assert_eq!(summary.submissions, 1);

    let updates = coordinator.updates().await;
    assert_eq!(updates.len(), 1);
    let batch = updates[0].as_array().expect("update body is an array");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0]["mint"], "mint-1");
    assert_eq!(batch[0]["index"], 1);
    assert_eq!(batch[0]["price"], 0.000123);

    assert_eq!(*captured.0.lock().unwrap(), vec!["mint-2".to_string()]);
}
