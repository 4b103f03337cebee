use price_worker::liveness::{bind, serve_on, LivenessState};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

async fn start() -> (String, CancellationToken, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();

    let state = LivenessState {
        worker_id: "webcon_test".into(),
        strategy: "onchain",
        endpoint_count: 3,
        metrics: None,
    };
    let handle = tokio::spawn(serve_on(listener, state, shutdown.clone()));

    (format!("http://{}", addr), shutdown, handle)
}

#[tokio::test]
async fn test_root_reports_worker_id() {
    let (base_url, shutdown, handle) = start().await;

    let response = reqwest::get(format!("{}/", base_url)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Worker webcon_test is running");

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let (base_url, shutdown, handle) = start().await;

    let response = reqwest::get(format!("{}/health", base_url)).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["worker"], "webcon_test");
    assert_eq!(body["strategy"], "onchain");
    assert_eq!(body["endpoints"], 3);
    assert!(body["timestamp"].is_string());

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let (base_url, shutdown, handle) = start().await;

    let response = reqwest::get(format!("{}/metrics", base_url)).await.unwrap();
    assert_eq!(response.status(), 404);

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_bind_fails_when_port_is_taken() {
    let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let result = bind(port).await;
    let error = result.expect_err("second bind on the same port");
    assert!(error.to_string().contains(&port.to_string()));
}

#[tokio::test]
async fn test_bind_free_port() {
    let listener = bind(0).await.unwrap();
    assert_ne!(listener.local_addr().unwrap().port(), 0);
}
