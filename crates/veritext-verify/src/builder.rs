// crates/veritext-verify/src/builder.rs
//
// ProofBuilder: derives proof artifacts from transcripts.
//
// Digest-binding artifacts carry H(canonical transcript) and the name of H.
// Signed attestations additionally carry an Ed25519 signature over the
// attestation message (format version, algorithm, digest, key reference),
// plus the key reference. The secret key never leaves SigningMaterial.

use veritext_core::crypto::{DigestAlgorithm, SigningMaterial, ED25519_SCHEME};
use veritext_core::error::VeritextError;
use veritext_core::proof::{
    attestation_message, ProofArtifact, ProofKind, SignatureBlock, FORMAT_VERSION,
};
use veritext_core::transcript::Transcript;

/// Builds proof artifacts with a fixed digest algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProofBuilder {
    algorithm: DigestAlgorithm,
}

impl ProofBuilder {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Build a proof of the requested kind.
    ///
    /// # Errors
    /// `SigningUnavailable` if `kind` is `SignedAttestation` and no signing
    /// material was supplied. Digest binding never fails.
    pub fn build(
        &self,
        transcript: &Transcript,
        kind: ProofKind,
        signing: Option<&SigningMaterial>,
    ) -> Result<ProofArtifact, VeritextError> {
        match kind {
            ProofKind::DigestBinding => Ok(self.digest_binding(transcript)),
            ProofKind::SignedAttestation => {
                let material = signing.ok_or_else(|| {
                    VeritextError::SigningUnavailable(
                        "signed attestation requested but no signing key is configured"
                            .to_string(),
                    )
                })?;
                Ok(self.signed_attestation(transcript, material))
            }
        }
    }

    /// Integrity-only proof.
    pub fn digest_binding(&self, transcript: &Transcript) -> ProofArtifact {
        let digest = self.algorithm.digest(transcript.canonical_bytes());
        ProofArtifact {
            format_version: FORMAT_VERSION,
            kind: ProofKind::DigestBinding.tag().to_string(),
            digest_algorithm: self.algorithm.id().to_string(),
            digest: hex::encode(digest),
            signature: None,
        }
    }

    /// Integrity plus authorship proof.
    pub fn signed_attestation(
        &self,
        transcript: &Transcript,
        material: &SigningMaterial,
    ) -> ProofArtifact {
        let digest = self.algorithm.digest(transcript.canonical_bytes());
        let key_id = material.key_id();
        let message = attestation_message(FORMAT_VERSION, self.algorithm.id(), &digest, &key_id);
        let signature = material.sign(&message);

        ProofArtifact {
            format_version: FORMAT_VERSION,
            kind: ProofKind::SignedAttestation.tag().to_string(),
            digest_algorithm: self.algorithm.id().to_string(),
            digest: hex::encode(digest),
            signature: Some(SignatureBlock {
                scheme: ED25519_SCHEME.to_string(),
                key_id,
                signature: hex::encode(signature),
            }),
        }
    }
}
