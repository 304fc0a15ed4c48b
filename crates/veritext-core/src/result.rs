// crates/veritext-core/src/result.rs

use serde::{Deserialize, Serialize};

use crate::proof::ProofArtifact;
use crate::provenance::ProvenanceMetadata;
use crate::transcript::Transcript;

/// The externally visible envelope returned to callers.
///
/// Holds everything a third party needs to verify the content, except the
/// original prompt and parameters, which the verifier obtains out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    pub proof: ProofArtifact,
    pub provenance: ProvenanceMetadata,
}

impl GenerationResult {
    /// Package a transcript and its proof. Copies by value; cannot fail.
    pub fn assemble(transcript: &Transcript, proof: &ProofArtifact) -> Self {
        Self {
            content: transcript.content().to_string(),
            proof: proof.clone(),
            provenance: transcript.provenance().clone(),
        }
    }
}
