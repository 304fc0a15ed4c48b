// crates/veritext-core/src/error.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide error type for Veritext.
///
/// Verification failures are deliberately absent: a proof that does not
/// check out is reported as a `VerificationOutcome`, never as an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VeritextError {
    /// The caller supplied a malformed request (empty prompt, duplicate
    /// parameter, oversized input). Not retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backing model service is temporarily unreachable, overloaded,
    /// or did not answer before the deadline. Retried with bounded backoff.
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// The backing model refused the request as invalid or unsafe. Not retried.
    #[error("Generation rejected: {0}")]
    GenerationRejected(String),

    /// A signed attestation was requested but no signing key is configured.
    #[error("Signing unavailable: {0}")]
    SigningUnavailable(String),

    /// Key parsing or signing failure.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of a [`VeritextError`], used on the wire so that
/// front ends can tell retryable from non-retryable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    GenerationUnavailable,
    GenerationRejected,
    SigningUnavailable,
    Internal,
}

impl VeritextError {
    /// The wire-level kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VeritextError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            VeritextError::GenerationUnavailable(_) => ErrorKind::GenerationUnavailable,
            VeritextError::GenerationRejected(_) => ErrorKind::GenerationRejected,
            VeritextError::SigningUnavailable(_) => ErrorKind::SigningUnavailable,
            VeritextError::Crypto(_) | VeritextError::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the same request after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VeritextError::GenerationUnavailable(_))
    }
}

impl From<serde_json::Error> for VeritextError {
    fn from(e: serde_json::Error) -> Self {
        VeritextError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for VeritextError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        VeritextError::Crypto(e.to_string())
    }
}

impl From<hex::FromHexError> for VeritextError {
    fn from(e: hex::FromHexError) -> Self {
        VeritextError::Serialization(format!("invalid hex: {}", e))
    }
}
