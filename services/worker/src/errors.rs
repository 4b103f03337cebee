//! Worker error types
//!
//! `ConfigError` is fatal at startup. `TransportError` covers every way a
//! remote call can fail and is always recovered where it occurs. Neither is
//! used for expected misses; those are `Resolution` variants.

use shared::errors::{ErrorCode, ServiceError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read endpoint file {path}: {source}")]
    EndpointsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("endpoint file {path} contains no endpoints")]
    EndpointsEmpty { path: PathBuf },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl From<&ConfigError> for ServiceError {
    fn from(error: &ConfigError) -> Self {
        let code = match error {
            ConfigError::EndpointsUnreadable { .. } => ErrorCode::CONFIG_ENDPOINTS_UNREADABLE,
            ConfigError::EndpointsEmpty { .. } => ErrorCode::CONFIG_ENDPOINTS_EMPTY,
            ConfigError::InvalidValue { .. } => ErrorCode::CONFIG_INVALID_VALUE,
        };
        ServiceError::configuration(code, error.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("timed out after {0} ms")]
    Timeout(u64),
}

impl TransportError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransportError::Http(_) => ErrorCode::TRANSPORT_HTTP,
            TransportError::Status { .. } => ErrorCode::TRANSPORT_STATUS,
            TransportError::Malformed(_) => ErrorCode::TRANSPORT_MALFORMED,
            TransportError::Rpc { .. } => ErrorCode::TRANSPORT_RPC,
            TransportError::Timeout(_) => ErrorCode::TRANSPORT_TIMEOUT,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        TransportError::Malformed(error.to_string())
    }
}

impl From<&TransportError> for ServiceError {
    fn from(error: &TransportError) -> Self {
        ServiceError::transport(error.code(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::errors::ErrorCategory;

    #[test]
    fn test_config_error_maps_to_fatal_service_error() {
        let error = ConfigError::EndpointsEmpty {
            path: PathBuf::from("apikeys.txt"),
        };
        let service_error = ServiceError::from(&error);
        assert_eq!(service_error.category, ErrorCategory::Configuration);
        assert_eq!(service_error.code, "CONFIG_ENDPOINTS_EMPTY");
        assert!(service_error.category.is_fatal());
    }

    #[test]
    fn test_transport_error_codes() {
        let error = TransportError::Rpc {
            code: -32602,
            message: "Invalid param".to_string(),
        };
        assert_eq!(error.code(), ErrorCode::TRANSPORT_RPC);
        assert_eq!(ServiceError::from(&error).category, ErrorCategory::Transport);
        assert_eq!(TransportError::Timeout(6000).to_string(), "timed out after 6000 ms");
    }

    #[test]
    fn test_json_error_is_malformed() {
        let error: TransportError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(error, TransportError::Malformed(_)));
    }
}
