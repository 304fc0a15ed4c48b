// crates/veritext-rpc/src/handlers/verify.rs
//
// VerifyProof: check a GenerationResult against the prompt and parameters
// the caller claims produced it. Always succeeds; the outcome says whether
// the proof holds.

use serde::{Deserialize, Serialize};

use veritext_core::result::GenerationResult;
use veritext_core::traits::TrustContext;
use veritext_verify::{verify_claim, VerificationOutcome};

use super::{to_params, ParamMap};
use crate::error::RpcError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyProofRequest {
    pub prompt: String,
    #[serde(default, deserialize_with = "super::unique_params")]
    pub params: ParamMap,
    pub result: GenerationResult,
}

/// Handle a VerifyProof request against the service's trusted keys.
pub async fn handle_verify_proof(
    trust: &dyn TrustContext,
    request: VerifyProofRequest,
) -> Result<VerificationOutcome, RpcError> {
    let params = to_params(&request.params);
    let outcome = verify_claim(&request.prompt, &params, &request.result, trust);

    match outcome.reason {
        None => tracing::info!(kind = %request.result.proof.kind, "Proof verified"),
        Some(reason) => tracing::info!(
            kind = %request.result.proof.kind,
            reason = %reason,
            "Proof rejected"
        ),
    }
    Ok(outcome)
}
