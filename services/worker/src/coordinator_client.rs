//! HTTP client for the coordinating server
//!
//! Claims batches of work items and posts computed prices back. Neither call
//! ever fails towards the caller: transport problems are logged and turn into
//! an empty batch or a dropped submission.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::errors::ServiceError;
use shared::{PriceObservation, WorkItem};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::errors::TransportError;

#[async_trait]
pub trait WorkCoordinator: Send + Sync {
    /// Claim up to `count` work items for `worker_id`. Empty on any failure.
    async fn acquire(&self, worker_id: &str, count: usize) -> Vec<WorkItem>;

    /// Report results. Fire-and-forget: failures are logged, never retried.
    async fn submit(&self, results: &[PriceObservation]);
}

#[derive(Clone)]
pub struct CoordinatorClient {
    http_client: Client,
    base_url: String,
}

impl CoordinatorClient {
    /// The coordinator is deployed behind a self-signed certificate, so
    /// certificate validation is switched off for this client only.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn acquire_once(&self, worker_id: &str, count: usize) -> Result<Vec<WorkItem>, TransportError> {
        let url = format!("{}/assign-token", self.base_url);

        let response = self
            .http_client
            .get(url)
            .query(&[("worker", worker_id.to_string()), ("count", count.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        parse_assignment(status, &body)
    }

    async fn submit_once(&self, results: &[PriceObservation]) -> Result<(), TransportError> {
        let url = format!("{}/update-token", self.base_url);

        let response = self.http_client.post(url).json(results).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl WorkCoordinator for CoordinatorClient {
    async fn acquire(&self, worker_id: &str, count: usize) -> Vec<WorkItem> {
        match self.acquire_once(worker_id, count).await {
            Ok(items) => {
                debug!(worker_id, requested = count, received = items.len(), "Acquired work items");
                metrics::counter!("worker_items_acquired_total").increment(items.len() as u64);
                items
            }
            Err(e) => {
                let report = ServiceError::from(&e);
                error!(worker_id, code = %report.code, error = %report.message, "assign-token call failed");
                metrics::counter!("worker_acquire_failures_total").increment(1);
                Vec::new()
            }
        }
    }

    async fn submit(&self, results: &[PriceObservation]) {
        if results.is_empty() {
            return;
        }

        match self.submit_once(results).await {
            Ok(()) => {
                info!(count = results.len(), "Submitted price results");
                metrics::counter!("worker_submissions_total").increment(1);
            }
            Err(e) => {
                let report = ServiceError::from(&e);
                error!(count = results.len(), code = %report.code, error = %report.message, "update-token call failed");
                metrics::counter!("worker_submission_failures_total").increment(1);
            }
        }
    }
}

/// Map an `assign-token` response to work items.
///
/// 204 is an empty batch, an array is taken element by element, a lone object
/// is a batch of one. Any other JSON shape is an empty batch.
pub fn parse_assignment(status: StatusCode, body: &[u8]) -> Result<Vec<WorkItem>, TransportError> {
    if status == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }

    if !status.is_success() {
        return Err(TransportError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    let data: Value = serde_json::from_slice(body)?;

    let items = match data {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<WorkItem>(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed work item");
                    None
                }
            })
            .collect(),
        value @ Value::Object(_) => match serde_json::from_value::<WorkItem>(value) {
            Ok(item) => vec![item],
            Err(e) => {
                warn!(error = %e, "Ignoring object without a mint");
                Vec::new()
            }
        },
        _ => Vec::new(),
    };

    Ok(items)
}
