// crates/veritext-core/src/provenance.rs

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::encoding::CanonicalWriter;

/// Who produced a piece of content, and when.
///
/// Stamped by the model adapter at invocation time. The timestamp is kept
/// at millisecond precision so that it survives JSON round trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceMetadata {
    /// Model identifier (e.g., "demo-model", "ollama/llama3").
    pub model_id: String,
    /// Model version string as reported by the backend.
    pub model_version: String,
    /// Wall-clock time of the invocation.
    pub timestamp: DateTime<Utc>,
    /// Hex-encoded random nonce, unique per invocation.
    pub nonce: String,
}

impl ProvenanceMetadata {
    /// Stamp provenance for an invocation happening now, with a fresh nonce.
    pub fn stamp(model_id: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: model_version.into(),
            timestamp: Utc::now().trunc_subsecs(3),
            nonce: fresh_nonce(),
        }
    }

    pub(crate) fn encode(&self, writer: &mut CanonicalWriter) {
        writer
            .put_str(&self.model_id)
            .put_str(&self.model_version)
            .put_i64(self.timestamp.timestamp_millis())
            .put_str(&self.nonce);
    }
}

/// 16 random bytes, hex-encoded.
pub fn fresh_nonce() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
