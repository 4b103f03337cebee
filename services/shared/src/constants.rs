/// Shared constants for the token price worker
///
/// This module centralizes protocol constants and pacing defaults so the
/// worker, its configuration layer and its tests agree on the same numbers.

use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// Wrapped SOL mint address (native SOL represented as SPL token)
///
/// Reference token for on-chain price derivation: a pool's price is the
/// wrapped SOL it holds divided by the tokens it holds.
pub const WRAPPED_SOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

/// Quote unit reported for on-chain derived prices
pub const ONCHAIN_PRICE_UNIT: &str = "SOL";

/// Quote unit reported by the price API
pub const PRICE_API_UNIT: &str = "USD";

/// Number of decimal places every reported price is rounded to
pub const PRICE_DECIMALS: i32 = 9;

/// Maximum number of holders attached to an observation
pub const TOP_HOLDER_LIMIT: usize = 10;

/// Work items requested from the coordinator per round
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Pause after every work item, successful or not (milliseconds)
pub const ITEM_DELAY_MS: u64 = 2_400;

/// Pause between two scan rounds (milliseconds)
pub const ROUND_DELAY_MS: u64 = 500;

/// Elapsed time since round start after which pending results are flushed
pub const FLUSH_AFTER_MS: u64 = 25_000;

/// Timeout for a single price API request (milliseconds)
pub const PRICE_API_TIMEOUT_MS: u64 = 5_000;

/// Attempts per RPC call before it yields no response
pub const RPC_MAX_ATTEMPTS: u32 = 3;

/// Timeout for one RPC attempt (milliseconds)
pub const RPC_CALL_TIMEOUT_MS: u64 = 6_000;

/// Pause after every RPC attempt regardless of outcome (milliseconds)
pub const RPC_SETTLE_PAUSE_MS: u64 = 500;

/// Extra pause after a failed RPC attempt before the next one (milliseconds)
pub const RPC_FAILURE_PAUSE_MS: u64 = 1_000;

/// JSON-RPC method names used for on-chain derivation
pub mod rpc_methods {
    pub const GET_TOKEN_LARGEST_ACCOUNTS: &str = "getTokenLargestAccounts";
    pub const GET_ACCOUNT_INFO: &str = "getAccountInfo";
    pub const GET_TOKEN_ACCOUNTS_BY_OWNER: &str = "getTokenAccountsByOwner";
    pub const GET_TOKEN_SUPPLY: &str = "getTokenSupply";
}
