//! Throwaway HTTP servers standing in for the coordinator, an RPC node and
//! the price API. Each binds 127.0.0.1 on a random port.
#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    format!("http://{}", addr)
}

/// Scripted reply for one `assign-token` call
#[derive(Debug, Clone)]
pub enum AssignReply {
    NoContent,
    Json(Value),
    Text(&'static str),
    Status(u16),
}

#[derive(Default)]
pub struct CoordinatorState {
    pub assign_replies: Mutex<Vec<AssignReply>>,
    pub assign_queries: Mutex<Vec<HashMap<String, String>>>,
    pub updates: Mutex<Vec<Value>>,
    pub update_status: Mutex<Option<u16>>,
}

pub struct FakeCoordinator {
    pub base_url: String,
    pub state: Arc<CoordinatorState>,
}

impl FakeCoordinator {
    pub async fn start(replies: Vec<AssignReply>) -> Self {
        let state = Arc::new(CoordinatorState {
            assign_replies: Mutex::new(replies),
            ..Default::default()
        });

        let app = Router::new()
            .route("/assign-token", get(assign_token))
            .route("/update-token", post(update_token))
            .with_state(state.clone());

        Self {
            base_url: spawn_server(app).await,
            state,
        }
    }

    pub async fn updates(&self) -> Vec<Value> {
        self.state.updates.lock().await.clone()
    }

    pub async fn assign_queries(&self) -> Vec<HashMap<String, String>> {
        self.state.assign_queries.lock().await.clone()
    }
}

async fn assign_token(
    State(state): State<Arc<CoordinatorState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.assign_queries.lock().await.push(query);

    let reply = {
        let mut replies = state.assign_replies.lock().await;
        if replies.is_empty() {
            AssignReply::NoContent
        } else {
            replies.remove(0)
        }
    };

    match reply {
        AssignReply::NoContent => StatusCode::NO_CONTENT.into_response(),
        AssignReply::Json(value) => Json(value).into_response(),
        AssignReply::Text(text) => text.into_response(),
        AssignReply::Status(code) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

async fn update_token(
    State(state): State<Arc<CoordinatorState>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.updates.lock().await.push(body);
    state
        .update_status
        .lock()
        .await
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK)
}

/// JSON-RPC node answering from a method -> result table. Methods listed in
/// `errors` answer with a JSON-RPC error object instead.
#[derive(Default)]
pub struct RpcState {
    pub results: HashMap<&'static str, Value>,
    pub errors: Vec<&'static str>,
    pub requests: Mutex<Vec<Value>>,
}

pub struct FakeRpcNode {
    pub url: String,
    pub state: Arc<RpcState>,
}

impl FakeRpcNode {
    pub async fn start(results: HashMap<&'static str, Value>, errors: Vec<&'static str>) -> Self {
        let state = Arc::new(RpcState {
            results,
            errors,
            ..Default::default()
        });

        let app = Router::new()
            .route("/", post(rpc_handler))
            .with_state(state.clone());

        Self {
            url: spawn_server(app).await,
            state,
        }
    }

    pub async fn methods_called(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .await
            .iter()
            .filter_map(|request| request["method"].as_str().map(str::to_string))
            .collect()
    }
}

async fn rpc_handler(State(state): State<Arc<RpcState>>, Json(request): Json<Value>) -> Json<Value> {
    state.requests.lock().await.push(request.clone());

    let method = request["method"].as_str().unwrap_or_default();
    let id = request["id"].clone();

    if state.errors.contains(&method) {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32005, "message": "Node is behind"}
        }));
    }

    match state.results.get(method) {
        Some(result) => Json(json!({"jsonrpc": "2.0", "id": id, "result": result})),
        None => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": "Method not found"}
        })),
    }
}

/// Chain state for a pool holding `token_amount` tokens and `sol_amount` wrapped SOL
pub fn pool_results(token_amount: f64, sol_amount: f64) -> HashMap<&'static str, Value> {
    let holders: Vec<Value> = (0..12)
        .map(|i| {
            json!({
                "address": format!("Holder{}", i),
                "amount": "0",
                "decimals": 6,
                "uiAmount": if i == 0 { token_amount } else { 100.0 - i as f64 },
                "uiAmountString": "0"
            })
        })
        .collect();

    let mut results = HashMap::new();
    results.insert(
        "getTokenLargestAccounts",
        json!({"context": {"slot": 1}, "value": holders}),
    );
    results.insert(
        "getAccountInfo",
        json!({"context": {"slot": 1}, "value": {
            "lamports": 2039280,
            "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "executable": false,
            "rentEpoch": 0,
            "data": {
                "program": "spl-token",
                "parsed": {"type": "account", "info": {
                    "owner": "PoolAuthority",
                    "tokenAmount": {"amount": "0", "decimals": 6, "uiAmount": token_amount, "uiAmountString": "0"}
                }},
                "space": 165
            }
        }}),
    );
    results.insert(
        "getTokenAccountsByOwner",
        json!({"context": {"slot": 1}, "value": [
            {"pubkey": "WsolAccount1", "account": {"data": {"parsed": {"info": {
                "tokenAmount": {"amount": "0", "decimals": 9, "uiAmount": sol_amount * 0.75, "uiAmountString": "0"}
            }}}}},
            {"pubkey": "WsolAccount2", "account": {"data": {"parsed": {"info": {
                "tokenAmount": {"amount": "0", "decimals": 9, "uiAmount": sol_amount * 0.25, "uiAmountString": "0"}
            }}}}}
        ]}),
    );
    results.insert(
        "getTokenSupply",
        json!({"context": {"slot": 1}, "value": {
            "amount": "1000000000000", "decimals": 6, "uiAmount": 1_000_000.0, "uiAmountString": "1000000"
        }}),
    );
    results
}
