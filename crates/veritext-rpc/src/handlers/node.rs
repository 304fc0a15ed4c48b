// crates/veritext-rpc/src/handlers/node.rs
//
// Node info and health handlers: GetNodeInfo, GetHealth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use veritext_core::proof::{ProofKind, FORMAT_VERSION};
use veritext_engine::ProofEngine;

use crate::error::RpcError;

// ---------------------------------------------------------------------------
// GetNodeInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodeInfoRequest {}

/// Response containing node information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodeInfoResponse {
    /// Software version.
    pub version: String,
    /// Proof format version produced by this node.
    pub format_version: u16,
    pub model_id: String,
    pub model_version: String,
    pub default_proof_kind: ProofKind,
    /// Digest algorithm for new proofs (e.g., "sha-256").
    pub digest_algorithm: String,
    /// Key reference carried by this node's signed attestations.
    pub signer_key_id: Option<String>,
    /// Hex-encoded public key matching `signer_key_id`.
    pub signer_public_key: Option<String>,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
}

/// Handle a GetNodeInfo request.
pub async fn handle_get_node_info(
    _request: GetNodeInfoRequest,
    engine: &ProofEngine,
    started_at: DateTime<Utc>,
) -> Result<GetNodeInfoResponse, RpcError> {
    let uptime_seconds = (Utc::now() - started_at).num_seconds().max(0) as u64;

    Ok(GetNodeInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        format_version: FORMAT_VERSION,
        model_id: engine.model_id().to_string(),
        model_version: engine.model_version().to_string(),
        default_proof_kind: engine.config().default_proof_kind,
        digest_algorithm: engine.config().digest_algorithm.id().to_string(),
        signer_key_id: engine.signer_key_id(),
        signer_public_key: engine.signer_public_key().map(hex::encode),
        started_at,
        uptime_seconds,
    })
}

// ---------------------------------------------------------------------------
// GetHealth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthRequest {}

/// Response containing node health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthResponse {
    /// "ok" once the engine is constructed.
    pub status: String,
    pub engine_ready: bool,
    /// Whether signed attestations can be produced.
    pub signing_enabled: bool,
    /// Human-readable details.
    pub details: Option<String>,
}

/// Handle a GetHealth request.
pub async fn handle_get_health(
    _request: GetHealthRequest,
    engine: &ProofEngine,
) -> Result<GetHealthResponse, RpcError> {
    let signing_enabled = engine.signing_enabled();
    let details = if signing_enabled {
        "digest-binding and signed-attestation proofs available".to_string()
    } else {
        "digest-binding proofs only (no signing key configured)".to_string()
    };

    Ok(GetHealthResponse {
        status: "ok".to_string(),
        engine_ready: true,
        signing_enabled,
        details: Some(details),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veritext_core::crypto::SigningMaterial;
    use veritext_engine::{EngineConfig, MockAdapter};

    #[tokio::test]
    async fn test_health_reports_signing() {
        let engine = ProofEngine::new(Arc::new(MockAdapter::demo()), EngineConfig::default());
        let resp = handle_get_health(GetHealthRequest {}, &engine).await.unwrap();
        assert_eq!(resp.status, "ok");
        assert!(resp.engine_ready);
        assert!(!resp.signing_enabled);

        let engine = engine.with_signing_material(SigningMaterial::generate());
        let resp = handle_get_health(GetHealthRequest {}, &engine).await.unwrap();
        assert!(resp.signing_enabled);
    }

    #[tokio::test]
    async fn test_node_info() {
        let material = SigningMaterial::generate();
        let key_id = material.key_id();
        let public_key = material.public_key_bytes();
        let engine = ProofEngine::new(Arc::new(MockAdapter::demo()), EngineConfig::default())
            .with_signing_material(material);

        let resp = handle_get_node_info(GetNodeInfoRequest {}, &engine, Utc::now())
            .await
            .unwrap();
        assert_eq!(resp.model_id, "demo-model");
        assert_eq!(resp.model_version, "1.0");
        assert_eq!(resp.format_version, FORMAT_VERSION);
        assert_eq!(resp.default_proof_kind, ProofKind::DigestBinding);
        assert_eq!(resp.digest_algorithm, "sha-256");
        assert_eq!(resp.signer_key_id, Some(key_id));
        assert_eq!(resp.signer_public_key, Some(hex::encode(public_key)));
    }
}
