/// Shared error types for the price worker
///
/// Design:
/// - Standardized error codes so log lines can be filtered programmatically
/// - Categorized by failure class (Configuration, Transport, Semantic)
/// - Only Configuration is fatal; the other two are recovered where they occur
///
/// Usage:
/// - Worker modules keep their own `thiserror` enums and convert into
///   ServiceError when reporting
/// - Error codes follow pattern: <CATEGORY>_<SPECIFIC>
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure class, which decides whether the process can continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Startup configuration is unusable; the process exits
    Configuration,

    /// Network failure, bad status or malformed body; recovered locally
    Transport,

    /// Expected absence of data (no holders, empty pool)
    Semantic,
}

impl ErrorCategory {
    /// Whether an error of this category terminates the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorCategory::Configuration)
    }
}

/// Standard error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    // Configuration errors
    pub const CONFIG_ENDPOINTS_UNREADABLE: ErrorCode = ErrorCode("CONFIG_ENDPOINTS_UNREADABLE");
    pub const CONFIG_ENDPOINTS_EMPTY: ErrorCode = ErrorCode("CONFIG_ENDPOINTS_EMPTY");
    pub const CONFIG_INVALID_VALUE: ErrorCode = ErrorCode("CONFIG_INVALID_VALUE");

    // Transport errors
    pub const TRANSPORT_HTTP: ErrorCode = ErrorCode("TRANSPORT_HTTP");
    pub const TRANSPORT_STATUS: ErrorCode = ErrorCode("TRANSPORT_STATUS");
    pub const TRANSPORT_MALFORMED: ErrorCode = ErrorCode("TRANSPORT_MALFORMED");
    pub const TRANSPORT_RPC: ErrorCode = ErrorCode("TRANSPORT_RPC");
    pub const TRANSPORT_TIMEOUT: ErrorCode = ErrorCode("TRANSPORT_TIMEOUT");

    // Semantic misses
    pub const SEMANTIC_NO_PRICE: ErrorCode = ErrorCode("SEMANTIC_NO_PRICE");
    pub const SEMANTIC_NO_POOL: ErrorCode = ErrorCode("SEMANTIC_NO_POOL");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standardized error structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error category (determines whether it is fatal)
    pub category: ErrorCategory,

    /// Structured error code
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

impl ServiceError {
    pub fn new(category: ErrorCategory, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.as_str().to_string(),
            message: message.into(),
        }
    }

    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Configuration, code, message)
    }

    pub fn transport(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Transport, code, message)
    }

    pub fn no_price(mint: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Semantic,
            ErrorCode::SEMANTIC_NO_PRICE,
            format!("No price available for {}", mint),
        )
    }

    pub fn no_pool(mint: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Semantic,
            ErrorCode::SEMANTIC_NO_POOL,
            format!("No liquidity pool for {}", mint),
        )
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}
