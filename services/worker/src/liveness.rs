//! Liveness and metrics HTTP endpoints

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct LivenessState {
    pub worker_id: Arc<str>,
    pub strategy: &'static str,
    pub endpoint_count: usize,
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: LivenessState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

async fn root(State(state): State<LivenessState>) -> String {
    format!("Worker {} is running", state.worker_id)
}

async fn health_check(State(state): State<LivenessState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "worker": &*state.worker_id,
        "strategy": state.strategy,
        "endpoints": state.endpoint_count,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn render_metrics(State(state): State<LivenessState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Bind the liveness port on all interfaces. Fails if the port is taken.
pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind liveness port {}", port))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

pub async fn serve_on(
    listener: TcpListener,
    state: LivenessState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
