use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use price_worker::config::{Config, PriceStrategy};
use price_worker::coordinator_client::CoordinatorClient;
use price_worker::endpoint_pool::EndpointPool;
use price_worker::liveness::{self, LivenessState};
use price_worker::pricing::{HttpPriceApi, OnchainResolver, PriceApiResolver, PriceResolver};
use price_worker::rpc_client::HttpTokenRpc;
use price_worker::scan_driver::ScanDriver;
use shared::errors::ServiceError;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging with JSON formatting (configurable via env)
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string())
        .eq_ignore_ascii_case("json");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "price_worker=info,shared=info".into());

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!(
        service = "price-worker",
        version = env!("CARGO_PKG_VERSION"),
        log_format = if use_json { "json" } else { "text" },
        "Starting price worker"
    );

    let config = Config::load().map_err(|e| {
        let report = ServiceError::from(&e);
        error!(code = %report.code, fatal = report.category.is_fatal(), error = %e, "Invalid configuration");
        e
    })?;

    let pool = EndpointPool::load(&config.pricing.endpoints_file).map_err(|e| {
        let report = ServiceError::from(&e);
        error!(code = %report.code, fatal = report.category.is_fatal(), error = %e, "Cannot load endpoints");
        e
    })?;
    let pool = Arc::new(pool);

    info!(
        worker_id = %config.worker.worker_id,
        strategy = config.pricing.strategy.as_str(),
        endpoints = pool.len(),
        coordinator = %config.coordinator.base_url,
        "Configuration loaded"
    );

    let resolver: Arc<dyn PriceResolver> = match config.pricing.strategy {
        PriceStrategy::Onchain => {
            let rpc = HttpTokenRpc::new().context("Failed to build RPC client")?;
            Arc::new(OnchainResolver::new(pool.clone(), Arc::new(rpc)))
        }
        PriceStrategy::PriceApi => {
            let api = HttpPriceApi::new(config.pricing.price_api_url.clone())
                .context("Failed to build price API client")?;
            Arc::new(PriceApiResolver::new(pool.clone(), Arc::new(api)))
        }
    };

    let coordinator = CoordinatorClient::new(
        config.coordinator.base_url.clone(),
        Duration::from_secs(config.coordinator.timeout_seconds),
    )
    .context("Failed to build coordinator client")?;

    let metrics = match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Metrics recorder not installed, /metrics disabled");
            None
        }
    };

    let shutdown = CancellationToken::new();

    let liveness_state = LivenessState {
        worker_id: config.worker.worker_id.as_str().into(),
        strategy: resolver.strategy(),
        endpoint_count: pool.len(),
        metrics,
    };
    let listener = liveness::bind(config.server.port).await.map_err(|e| {
        error!(port = config.server.port, error = %e, "Cannot start liveness endpoint");
        e
    })?;
    let server_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = liveness::serve_on(listener, liveness_state, shutdown).await {
                error!(error = %e, "Liveness server failed");
            }
        }
    });

    let driver = ScanDriver::new(Arc::new(coordinator), resolver, config.worker.clone());
    let mut driver_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { driver.run(shutdown).await }
    });

    info!("Price worker running");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    shutdown.cancel();

    // Let the round in flight finish and submit its results
    let grace = config.worker.shutdown_grace();
    if tokio::time::timeout(grace, &mut driver_handle).await.is_err() {
        warn!(grace_seconds = grace.as_secs(), "Round still running after grace period, aborting");
        driver_handle.abort();
    }

    server_handle.abort();

    info!("Price worker stopped");

    Ok(())
}
