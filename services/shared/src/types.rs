/// Wire types exchanged with the coordinator and type-safe domain primitives
///
/// Work items come in from `assign-token`, price observations go out through
/// `update-token`. Both use the coordinator's camelCase JSON layout.

use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::constants::*;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid mint address: {0}")]
    InvalidMintAddress(String),
}

/// Validated SPL mint address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MintAddress(Pubkey);

impl TryFrom<&str> for MintAddress {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value
            .trim()
            .parse::<Pubkey>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidMintAddress(value.to_string()))
    }
}

impl std::fmt::Display for MintAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of work handed out by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub mint: String,
    #[serde(
        default,
        deserialize_with = "lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub index: Option<u64>,
}

/// Any JSON shape a coordinator may send as an item index
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIndex {
    Integer(u64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

fn whole_number(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64)
        .then_some(value as u64)
}

/// Accepts `5`, `5.0` and `"5"`. Anything else reads as no index, so the
/// item itself is still priced.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let index = match Option::<RawIndex>::deserialize(deserializer)? {
        Some(RawIndex::Integer(value)) => Some(value),
        Some(RawIndex::Float(value)) => whole_number(value),
        Some(RawIndex::Text(text)) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
        }
        Some(RawIndex::Other(_)) | None => None,
    };
    Ok(index)
}

impl WorkItem {
    pub fn new(mint: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            index: None,
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }
}

/// Holder of a token and the amount it holds (UI units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderEntry {
    pub address: String,
    pub amount: f64,
}

/// Where a price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    /// Derived from the largest holder's pool balances
    Onchain,
    /// Quoted by the price API
    PriceApi,
}

impl PriceSource {
    pub fn unit(&self) -> &'static str {
        match self {
            PriceSource::Onchain => ONCHAIN_PRICE_UNIT,
            PriceSource::PriceApi => PRICE_API_UNIT,
        }
    }
}

/// A resolved price for one work item, as submitted to `update-token`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceObservation {
    pub mint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    pub price: f64,
    pub unit: String,
    pub source: PriceSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_holders: Option<Vec<HolderEntry>>,
    /// Unix seconds
    pub timestamp: i64,
    /// Local wall-clock time of the scan
    pub scan_time: String,
}

/// Round a price to [`PRICE_DECIMALS`] decimal places
pub fn round_price(value: f64) -> f64 {
    let scale = 10f64.powi(PRICE_DECIMALS);
    (value * scale).round() / scale
}
