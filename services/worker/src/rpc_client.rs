//! JSON-RPC 2.0 client for the four token queries used in price derivation
//!
//! Talks to whichever endpoint the caller picked. Retries and timeouts are the
//! caller's job (see `RetryPolicy`); this layer only turns one request into a
//! typed result or a `TransportError`.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::constants::rpc_methods;
use shared::HolderEntry;

use crate::endpoint_pool::Endpoint;
use crate::errors::TransportError;

/// Owner and balance of an SPL token account
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAccountInfo {
    pub owner: Option<String>,
    pub amount: f64,
}

#[async_trait]
pub trait TokenRpc: Send + Sync {
    /// Largest holder accounts of `mint`, biggest first
    async fn largest_accounts(
        &self,
        endpoint: &Endpoint,
        mint: &str,
    ) -> Result<Vec<HolderEntry>, TransportError>;

    /// Parsed token account; `None` if the account does not exist
    async fn token_account(
        &self,
        endpoint: &Endpoint,
        address: &str,
    ) -> Result<Option<TokenAccountInfo>, TransportError>;

    /// Total balance of `mint` across all token accounts owned by `owner`
    async fn owner_balance(
        &self,
        endpoint: &Endpoint,
        owner: &str,
        mint: &str,
    ) -> Result<f64, TransportError>;

    async fn token_supply(&self, endpoint: &Endpoint, mint: &str) -> Result<f64, TransportError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiTokenAmount {
    ui_amount: Option<f64>,
    ui_amount_string: Option<String>,
}

impl UiTokenAmount {
    fn value(&self) -> f64 {
        self.ui_amount
            .or_else(|| self.ui_amount_string.as_deref().and_then(|s| s.parse().ok()))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct LargestAccount {
    address: String,
    #[serde(flatten)]
    amount: UiTokenAmount,
}

#[derive(Debug, Deserialize)]
struct ParsedAccount {
    data: Value,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    account: ParsedAccount,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedTokenInfo {
    owner: Option<String>,
    token_amount: Option<UiTokenAmount>,
}

/// `parsed.info` of a jsonParsed token account. Anything else reads as empty.
fn parsed_token_info(data: &Value) -> ParsedTokenInfo {
    data.pointer("/parsed/info")
        .cloned()
        .and_then(|info| serde_json::from_value(info).ok())
        .unwrap_or_default()
}

fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    let envelope: RpcResponse<T> = serde_json::from_slice(body)?;

    if let Some(error) = envelope.error {
        return Err(TransportError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    envelope
        .result
        .ok_or_else(|| TransportError::Malformed("no result in RPC response".to_string()))
}

fn request_body(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

/// `TokenRpc` over HTTP POST
#[derive(Clone)]
pub struct HttpTokenRpc {
    http: Client,
}

impl HttpTokenRpc {
    pub fn new() -> Result<Self, TransportError> {
        let http = Client::builder().build()?;
        Ok(Self { http })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        method: &str,
        params: Value,
    ) -> Result<T, TransportError> {
        tracing::debug!(method, "RPC call");

        let response = self
            .http
            .post(endpoint.as_str())
            .json(&request_body(method, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response.bytes().await?;
        decode_response(&body)
    }
}

#[async_trait]
impl TokenRpc for HttpTokenRpc {
    async fn largest_accounts(
        &self,
        endpoint: &Endpoint,
        mint: &str,
    ) -> Result<Vec<HolderEntry>, TransportError> {
        let response: WithContext<Vec<LargestAccount>> = self
            .call(endpoint, rpc_methods::GET_TOKEN_LARGEST_ACCOUNTS, json!([mint]))
            .await?;

        Ok(response
            .value
            .into_iter()
            .map(|account| HolderEntry {
                amount: account.amount.value(),
                address: account.address,
            })
            .collect())
    }

    async fn token_account(
        &self,
        endpoint: &Endpoint,
        address: &str,
    ) -> Result<Option<TokenAccountInfo>, TransportError> {
        let response: WithContext<Option<ParsedAccount>> = self
            .call(
                endpoint,
                rpc_methods::GET_ACCOUNT_INFO,
                json!([address, { "encoding": "jsonParsed" }]),
            )
            .await?;

        Ok(response.value.map(|account| {
            let info = parsed_token_info(&account.data);
            TokenAccountInfo {
                owner: info.owner,
                amount: info.token_amount.map(|a| a.value()).unwrap_or(0.0),
            }
        }))
    }

    async fn owner_balance(
        &self,
        endpoint: &Endpoint,
        owner: &str,
        mint: &str,
    ) -> Result<f64, TransportError> {
        let response: WithContext<Vec<KeyedAccount>> = self
            .call(
                endpoint,
                rpc_methods::GET_TOKEN_ACCOUNTS_BY_OWNER,
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed" }]),
            )
            .await?;

        Ok(response
            .value
            .iter()
            .filter_map(|keyed| parsed_token_info(&keyed.account.data).token_amount)
            .map(|amount| amount.value())
            .sum())
    }

    async fn token_supply(&self, endpoint: &Endpoint, mint: &str) -> Result<f64, TransportError> {
        let response: WithContext<UiTokenAmount> = self
            .call(endpoint, rpc_methods::GET_TOKEN_SUPPLY, json!([mint]))
            .await?;

        Ok(response.value.value())
    }
}
