//! Price resolution
//!
//! A process runs exactly one strategy, picked by configuration:
//! - `OnchainResolver` derives the price from the largest holder's balances
//!   through a sequence of retried JSON-RPC calls
//! - `PriceApiResolver` asks a price API once under a fixed timeout
//!
//! Resolution never fails. Every outcome is one of the `Resolution` variants.

mod onchain;
mod price_api;

pub use onchain::OnchainResolver;
pub use price_api::{HttpPriceApi, PriceApiResolver, PriceQuoteApi};

use async_trait::async_trait;
use shared::{PriceObservation, WorkItem};

/// Outcome of resolving one work item
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A usable price
    Observation(PriceObservation),
    /// No price could be obtained (missing data or every attempt failed)
    NoObservation,
    /// The largest holder holds none of the reference token
    NoPool,
}

impl Resolution {
    pub fn observation(&self) -> Option<&PriceObservation> {
        match self {
            Resolution::Observation(observation) => Some(observation),
            Resolution::NoObservation | Resolution::NoPool => None,
        }
    }
}

#[async_trait]
pub trait PriceResolver: Send + Sync {
    async fn resolve(&self, item: &WorkItem) -> Resolution;

    /// Strategy name for logs and the health endpoint
    fn strategy(&self) -> &'static str;
}

/// Local wall-clock time, e.g. `14:05:09`. The round driver overwrites it
/// with the time its round started.
pub(crate) fn scan_time_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
