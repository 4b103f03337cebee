//! Token price worker
//!
//! Claims batches of token mints from a coordinator, resolves a price for each
//! through one of the configured endpoints and reports the results back.

pub mod config;
pub mod coordinator_client;
pub mod endpoint_pool;
pub mod errors;
pub mod liveness;
pub mod pricing;
pub mod retry_strategy;
pub mod rpc_client;
pub mod scan_driver;

pub use config::{Config, PriceStrategy, WorkerConfig};
pub use coordinator_client::{CoordinatorClient, WorkCoordinator};
pub use endpoint_pool::{Endpoint, EndpointPool};
pub use pricing::{PriceResolver, Resolution};
pub use scan_driver::{RoundSummary, ScanDriver};
