use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use shared::constants::PRICE_API_TIMEOUT_MS;
use shared::{round_price, MintAddress, PriceObservation, PriceSource, WorkItem};
use std::sync::Arc;
use std::time::Duration;

use super::{scan_time_now, unix_now, PriceResolver, Resolution};
use crate::endpoint_pool::{Endpoint, EndpointPool};
use crate::errors::TransportError;
use crate::retry_strategy::race_with_timeout;

#[async_trait]
pub trait PriceQuoteApi: Send + Sync {
    /// Quote `mint` using `api_key`. `Ok(None)` means the API knows no price.
    async fn quote(&self, api_key: &Endpoint, mint: &str) -> Result<Option<f64>, TransportError>;
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    prices: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    price: Option<f64>,
}

/// `POST {base_url}/tokens/price?api-key={key}` with `{"tokens": [mint]}`
#[derive(Clone)]
pub struct HttpPriceApi {
    http: Client,
    base_url: String,
}

impl HttpPriceApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceQuoteApi for HttpPriceApi {
    async fn quote(&self, api_key: &Endpoint, mint: &str) -> Result<Option<f64>, TransportError> {
        let url = format!("{}/tokens/price", self.base_url);

        let response = self
            .http
            .post(url)
            .query(&[("api-key", api_key.as_str())])
            .json(&json!({ "tokens": [mint] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response.bytes().await?;
        let data: PriceResponse = serde_json::from_slice(&body)?;
        Ok(data.prices.first().and_then(|entry| entry.price))
    }
}

/// Single price API request per item, raced against a fixed timeout. No retry.
pub struct PriceApiResolver {
    pool: Arc<EndpointPool>,
    api: Arc<dyn PriceQuoteApi>,
    timeout: Duration,
}

impl PriceApiResolver {
    pub fn new(pool: Arc<EndpointPool>, api: Arc<dyn PriceQuoteApi>) -> Self {
        Self {
            pool,
            api,
            timeout: Duration::from_millis(PRICE_API_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PriceResolver for PriceApiResolver {
    async fn resolve(&self, item: &WorkItem) -> Resolution {
        let mint = match MintAddress::try_from(item.mint.as_str()) {
            Ok(mint) => mint.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid mint");
                return Resolution::NoObservation;
            }
        };

        let (endpoint_index, api_key) = self.pool.pick_random();

        let price = match race_with_timeout(self.timeout, self.api.quote(api_key, &mint)).await {
            Some(Ok(Some(price))) if price.is_finite() && price != 0.0 => price,
            Some(Ok(_)) => return Resolution::NoObservation,
            Some(Err(e)) => {
                tracing::warn!(
                    mint = %mint,
                    endpoint = endpoint_index,
                    code = %e.code(),
                    error = %e,
                    "Price API request failed"
                );
                return Resolution::NoObservation;
            }
            None => {
                tracing::warn!(
                    mint = %mint,
                    endpoint = endpoint_index,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Price API request timed out"
                );
                return Resolution::NoObservation;
            }
        };

        let source = PriceSource::PriceApi;
        Resolution::Observation(PriceObservation {
            mint,
            index: item.index,
            price: round_price(price),
            unit: source.unit().to_string(),
            source,
            supply: None,
            pool_address: None,
            top_holders: None,
            timestamp: unix_now(),
            scan_time: scan_time_now(),
        })
    }

    fn strategy(&self) -> &'static str {
        "price_api"
    }
}
