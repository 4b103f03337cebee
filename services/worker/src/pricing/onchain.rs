use async_trait::async_trait;
use shared::constants::{rpc_methods, TOP_HOLDER_LIMIT, WRAPPED_SOL_MINT};
use shared::{round_price, MintAddress, PriceObservation, PriceSource, WorkItem};
use std::sync::Arc;
use tracing::Instrument;

use super::{scan_time_now, unix_now, PriceResolver, Resolution};
use crate::endpoint_pool::{Endpoint, EndpointPool};
use crate::retry_strategy::RetryPolicy;
use crate::rpc_client::{TokenAccountInfo, TokenRpc};

/// Derives a token's price from the pool holding most of its supply.
///
/// The largest holder account is taken to be the liquidity pool; its owner's
/// wrapped SOL balance divided by the pool's token balance is the price.
pub struct OnchainResolver {
    pool: Arc<EndpointPool>,
    rpc: Arc<dyn TokenRpc>,
    retry: RetryPolicy,
    reference_mint: String,
}

impl OnchainResolver {
    pub fn new(pool: Arc<EndpointPool>, rpc: Arc<dyn TokenRpc>) -> Self {
        Self {
            pool,
            rpc,
            retry: RetryPolicy::default(),
            reference_mint: WRAPPED_SOL_MINT.to_string(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run the call sequence for `item` against one endpoint.
    pub async fn resolve_with(&self, item: &WorkItem, endpoint: &Endpoint) -> Resolution {
        let mint = match MintAddress::try_from(item.mint.as_str()) {
            Ok(mint) => mint.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid mint");
                return Resolution::NoObservation;
            }
        };

        let Some(holders) = self
            .retry
            .run(rpc_methods::GET_TOKEN_LARGEST_ACCOUNTS, || {
                self.rpc.largest_accounts(endpoint, &mint)
            })
            .await
        else {
            return Resolution::NoObservation;
        };

        let Some(largest) = holders.first() else {
            tracing::debug!("No holder accounts");
            return Resolution::NoObservation;
        };

        let Some(account) = self
            .retry
            .run(rpc_methods::GET_ACCOUNT_INFO, || {
                self.rpc.token_account(endpoint, &largest.address)
            })
            .await
        else {
            return Resolution::NoObservation;
        };

        let (owner, token_amount) = match account {
            Some(TokenAccountInfo {
                owner: Some(owner),
                amount,
            }) if amount > 0.0 => (owner, amount),
            _ => {
                tracing::debug!(pool = %largest.address, "Pool account has no owner or zero balance");
                return Resolution::NoObservation;
            }
        };

        let Some(reference_amount) = self
            .retry
            .run(rpc_methods::GET_TOKEN_ACCOUNTS_BY_OWNER, || {
                self.rpc.owner_balance(endpoint, &owner, &self.reference_mint)
            })
            .await
        else {
            return Resolution::NoObservation;
        };

        if reference_amount <= 0.0 {
            tracing::debug!(owner = %owner, "No liquidity pool");
            return Resolution::NoPool;
        }

        let Some(supply) = self
            .retry
            .run(rpc_methods::GET_TOKEN_SUPPLY, || {
                self.rpc.token_supply(endpoint, &mint)
            })
            .await
        else {
            return Resolution::NoObservation;
        };

        let price = round_price(reference_amount / token_amount);
        if !price.is_finite() {
            return Resolution::NoObservation;
        }

        let source = PriceSource::Onchain;
        Resolution::Observation(PriceObservation {
            mint,
            index: item.index,
            price,
            unit: source.unit().to_string(),
            source,
            supply: Some(supply),
            pool_address: Some(largest.address.clone()),
            top_holders: Some(holders.iter().take(TOP_HOLDER_LIMIT).cloned().collect()),
            timestamp: unix_now(),
            scan_time: scan_time_now(),
        })
    }
}

#[async_trait]
impl PriceResolver for OnchainResolver {
    async fn resolve(&self, item: &WorkItem) -> Resolution {
        let (endpoint_index, endpoint) = self.pool.pick_random();
        let span = tracing::debug_span!("onchain_price", mint = %item.mint, endpoint = endpoint_index);
        self.resolve_with(item, endpoint).instrument(span).await
    }

    fn strategy(&self) -> &'static str {
        "onchain"
    }
}
