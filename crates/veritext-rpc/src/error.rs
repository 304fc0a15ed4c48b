// crates/veritext-rpc/src/error.rs
//
// Structured error object carried in failed JSON-RPC responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use veritext_core::error::{ErrorKind, VeritextError};

/// `{kind, message, retryable}` as seen by RPC clients.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct RpcError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl RpcError {
    /// Malformed envelope, unknown method or undecodable params.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<VeritextError> for RpcError {
    fn from(err: VeritextError) -> Self {
        Self {
            kind: err.kind(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_engine_error_keeps_kind_and_retryability() {
        let err = RpcError::from(VeritextError::GenerationUnavailable("timeout".into()));
        assert_eq!(err.kind, ErrorKind::GenerationUnavailable);
        assert!(err.retryable);
        assert!(err.message.contains("timeout"));

        let err = RpcError::from(VeritextError::SigningUnavailable("no key".into()));
        assert_eq!(err.kind, ErrorKind::SigningUnavailable);
        assert!(!err.retryable);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(RpcError::invalid_request("bad")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "invalid_request", "message": "bad", "retryable": false})
        );
    }
}
