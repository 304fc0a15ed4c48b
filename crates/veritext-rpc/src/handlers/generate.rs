// crates/veritext-rpc/src/handlers/generate.rs
//
// GenerateText: run the engine and return content with its proof.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use veritext_core::proof::ProofKind;
use veritext_core::result::GenerationResult;
use veritext_engine::{GenerateOptions, ProofEngine};

use super::{to_params, ParamMap};
use crate::error::RpcError;

/// Request to generate verifiable text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: String,
    #[serde(default, deserialize_with = "super::unique_params")]
    pub params: ParamMap,
    /// "digest-binding" or "signed-attestation"; engine default if absent.
    #[serde(default)]
    pub proof_kind: Option<ProofKind>,
    /// Deadline for the model call; engine default if absent.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// Handle a GenerateText request.
pub async fn handle_generate_text(
    engine: &ProofEngine,
    request: GenerateTextRequest,
) -> Result<GenerationResult, RpcError> {
    let options = GenerateOptions {
        proof_kind: request.proof_kind,
        deadline: request.deadline_ms.map(Duration::from_millis),
    };
    let params = to_params(&request.params);

    engine
        .generate(&request.prompt, &params, options)
        .await
        .map_err(|e| {
            tracing::warn!(kind = ?e.kind(), "Generation failed: {}", e);
            RpcError::from(e)
        })
}
