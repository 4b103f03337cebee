use serde::Deserialize;
use shared::constants::*;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub worker: WorkerConfig,
    pub coordinator: CoordinatorConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub batch_size: usize,
    pub item_delay_ms: u64,
    pub round_delay_ms: u64,
    pub flush_after_ms: u64,
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    pub strategy: PriceStrategy,
    pub endpoints_file: PathBuf,
    pub price_api_url: String,
}

/// Which resolver a worker process runs. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStrategy {
    /// Derive the price from the largest holder's balances over JSON-RPC
    Onchain,
    /// Ask the price API directly
    PriceApi,
}

impl PriceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceStrategy::Onchain => "onchain",
            PriceStrategy::PriceApi => "price_api",
        }
    }
}

impl FromStr for PriceStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onchain" => Ok(PriceStrategy::Onchain),
            "price_api" | "price-api" => Ok(PriceStrategy::PriceApi),
            _ => Err(()),
        }
    }
}

impl WorkerConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }

    pub fn flush_after(&self) -> Duration {
        Duration::from_millis(self.flush_after_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: "webcon_006".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            item_delay_ms: ITEM_DELAY_MS,
            round_delay_ms: ROUND_DELAY_MS,
            flush_after_ms: FLUSH_AFTER_MS,
            shutdown_grace_seconds: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `load` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = WorkerConfig::default();

        Ok(Config {
            server: ServerConfig {
                port: parse_or(&lookup, "PORT", 3000)?,
            },
            worker: WorkerConfig {
                worker_id: lookup("WORKER")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(defaults.worker_id),
                batch_size: parse_or(&lookup, "BATCH_SIZE", defaults.batch_size)?,
                item_delay_ms: parse_or(&lookup, "ITEM_DELAY_MS", defaults.item_delay_ms)?,
                round_delay_ms: parse_or(&lookup, "ROUND_DELAY_MS", defaults.round_delay_ms)?,
                flush_after_ms: parse_or(&lookup, "FLUSH_AFTER_MS", defaults.flush_after_ms)?,
                shutdown_grace_seconds: parse_or(
                    &lookup,
                    "SHUTDOWN_GRACE_SECS",
                    defaults.shutdown_grace_seconds,
                )?,
            },
            coordinator: CoordinatorConfig {
                base_url: lookup("COORDINATOR_URL")
                    .unwrap_or_else(|| "http://localhost:8080".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout_seconds: parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?,
            },
            pricing: PricingConfig {
                strategy: parse_or(&lookup, "PRICE_STRATEGY", PriceStrategy::Onchain)?,
                endpoints_file: lookup("ENDPOINTS_FILE")
                    .unwrap_or_else(|| "apikeys.txt".to_string())
                    .into(),
                price_api_url: lookup("PRICE_API_URL")
                    .unwrap_or_else(|| "https://api.helius.xyz/v0".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
