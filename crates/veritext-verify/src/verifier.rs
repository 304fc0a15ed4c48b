// crates/veritext-verify/src/verifier.rs
//
// Proof verification. Pure functions: no I/O, no mutation, no panics on
// hostile input. Every failure is an ordinary VerificationOutcome.
//
// Algorithm:
//   1. format version and proof kind must be known       -> UnknownAlgorithm
//   2. digest algorithm must be known                    -> UnknownAlgorithm
//   3. recompute H(canonical transcript), compare         -> DigestMismatch
//   4. signed kind only: scheme known                    -> UnknownAlgorithm
//                        key reference resolves           -> UnresolvedKey
//                        signature over recomputed digest -> SignatureInvalid

use std::fmt;

use serde::{Deserialize, Serialize};

use veritext_core::crypto::{verify_signature, DigestAlgorithm, ED25519_SCHEME};
use veritext_core::proof::{attestation_message, ProofArtifact, ProofKind, FORMAT_VERSION};
use veritext_core::request::{Canonicalizer, GenerationParam};
use veritext_core::result::GenerationResult;
use veritext_core::traits::TrustContext;
use veritext_core::transcript::Transcript;

/// Why a proof did not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The recomputed transcript digest differs from the one in the proof.
    DigestMismatch,
    /// The signature does not verify under the resolved public key.
    SignatureInvalid,
    /// Unknown format version, proof kind, digest or signature algorithm.
    UnknownAlgorithm,
    /// The trust context has no key for the artifact's key reference.
    UnresolvedKey,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::DigestMismatch => "digest mismatch",
            FailureReason::SignatureInvalid => "signature invalid",
            FailureReason::UnknownAlgorithm => "unknown algorithm",
            FailureReason::UnresolvedKey => "unresolved key",
        };
        f.write_str(s)
    }
}

/// Result of checking a proof: `{valid, reason}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl VerificationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: FailureReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Trust context that trusts nothing. Enough for digest-binding proofs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrust;

impl TrustContext for NoTrust {
    fn resolve(&self, _key_id: &str) -> Option<[u8; 32]> {
        None
    }
}

/// Trust context pinned to a single public key, whatever the artifact's
/// key reference says.
#[derive(Debug, Clone, Copy)]
pub struct PinnedKey(pub [u8; 32]);

impl TrustContext for PinnedKey {
    fn resolve(&self, _key_id: &str) -> Option<[u8; 32]> {
        Some(self.0)
    }
}

/// Verify `artifact` against `transcript`.
pub fn verify(
    transcript: &Transcript,
    artifact: &ProofArtifact,
    trust: &dyn TrustContext,
) -> VerificationOutcome {
    if artifact.format_version != FORMAT_VERSION {
        return VerificationOutcome::invalid(FailureReason::UnknownAlgorithm);
    }
    let Some(kind) = artifact.proof_kind() else {
        return VerificationOutcome::invalid(FailureReason::UnknownAlgorithm);
    };
    let Some(algorithm) = DigestAlgorithm::from_id(&artifact.digest_algorithm) else {
        return VerificationOutcome::invalid(FailureReason::UnknownAlgorithm);
    };

    let recomputed = algorithm.digest(transcript.canonical_bytes());
    match hex::decode(&artifact.digest) {
        Ok(claimed) if claimed == recomputed => {}
        _ => return VerificationOutcome::invalid(FailureReason::DigestMismatch),
    }

    match kind {
        ProofKind::DigestBinding => VerificationOutcome::valid(),
        ProofKind::SignedAttestation => check_signature(artifact, algorithm, &recomputed, trust),
    }
}

fn check_signature(
    artifact: &ProofArtifact,
    algorithm: DigestAlgorithm,
    recomputed: &[u8],
    trust: &dyn TrustContext,
) -> VerificationOutcome {
    let Some(block) = artifact.signature.as_ref() else {
        return VerificationOutcome::invalid(FailureReason::SignatureInvalid);
    };
    if block.scheme != ED25519_SCHEME {
        return VerificationOutcome::invalid(FailureReason::UnknownAlgorithm);
    }
    let Some(public_key) = trust.resolve(&block.key_id) else {
        return VerificationOutcome::invalid(FailureReason::UnresolvedKey);
    };
    let Ok(signature) = hex::decode(&block.signature) else {
        return VerificationOutcome::invalid(FailureReason::SignatureInvalid);
    };

    let message = attestation_message(
        artifact.format_version,
        algorithm.id(),
        recomputed,
        &block.key_id,
    );
    match verify_signature(&public_key, &message, &signature) {
        Ok(true) => VerificationOutcome::valid(),
        Ok(false) | Err(_) => VerificationOutcome::invalid(FailureReason::SignatureInvalid),
    }
}

/// Verify a returned result against the original prompt and parameters,
/// which the verifier holds out of band.
///
/// The transcript is reconstructed with an unbounded canonicalizer. Inputs
/// that cannot be canonicalized at all cannot match any digest and are
/// reported as `DigestMismatch`.
pub fn verify_claim(
    prompt: &str,
    params: &[GenerationParam],
    result: &GenerationResult,
    trust: &dyn TrustContext,
) -> VerificationOutcome {
    let Ok(request) = Canonicalizer::unbounded().canonicalize(prompt, params) else {
        return VerificationOutcome::invalid(FailureReason::DigestMismatch);
    };
    let Ok(transcript) =
        Transcript::record(request, result.content.clone(), result.provenance.clone())
    else {
        return VerificationOutcome::invalid(FailureReason::DigestMismatch);
    };
    verify(&transcript, &result.proof, trust)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProofBuilder;
    use veritext_core::crypto::SigningMaterial;
    use veritext_core::proof::SignatureBlock;
    use veritext_core::provenance::ProvenanceMetadata;
    use veritext_core::request::canonicalize;

    fn capital_transcript(content: &str, provenance: ProvenanceMetadata) -> Transcript {
        let req = canonicalize("What is the capital of France?", &[]).unwrap();
        Transcript::record(req, content, provenance).unwrap()
    }

    #[test]
    fn test_capital_of_france_scenario() {
        let provenance = ProvenanceMetadata::stamp("demo-model", "1.0");
        let t = capital_transcript("Paris", provenance.clone());
        let proof = ProofBuilder::default()
            .build(&t, ProofKind::DigestBinding, None)
            .unwrap();

        assert!(verify(&t, &proof, &NoTrust).is_valid());

        // Flip one byte of content: 's' (0x73) -> 't' (0x74).
        let tampered = capital_transcript("Parit", provenance);
        assert_eq!(
            verify(&tampered, &proof, &NoTrust),
            VerificationOutcome::invalid(FailureReason::DigestMismatch)
        );
    }

    #[test]
    fn test_signed_attestation_roundtrip() {
        let material = SigningMaterial::generate();
        let t = capital_transcript("Paris", ProvenanceMetadata::stamp("demo-model", "1.0"));
        let proof = ProofBuilder::default()
            .build(&t, ProofKind::SignedAttestation, Some(&material))
            .unwrap();

        let trust = PinnedKey(material.public_key_bytes());
        assert!(verify(&t, &proof, &trust).is_valid());
    }

    #[test]
    fn test_signed_attestation_wrong_key() {
        let signer = SigningMaterial::generate();
        let impostor = SigningMaterial::generate();
        let t = capital_transcript("Paris", ProvenanceMetadata::stamp("demo-model", "1.0"));
        let proof = ProofBuilder::default().signed_attestation(&t, &signer);

        assert_eq!(
            verify(&t, &proof, &PinnedKey(impostor.public_key_bytes())),
            VerificationOutcome::invalid(FailureReason::SignatureInvalid)
        );
    }

    #[test]
    fn test_signed_attestation_unresolved_key() {
        let signer = SigningMaterial::generate();
        let t = capital_transcript("Paris", ProvenanceMetadata::stamp("demo-model", "1.0"));
        let proof = ProofBuilder::default().signed_attestation(&t, &signer);

        assert_eq!(
            verify(&t, &proof, &NoTrust),
            VerificationOutcome::invalid(FailureReason::UnresolvedKey)
        );
    }

    #[test]
    fn test_tampered_signed_content_is_digest_mismatch() {
        let signer = SigningMaterial::generate();
        let provenance = ProvenanceMetadata::stamp("demo-model", "1.0");
        let t = capital_transcript("Paris", provenance.clone());
        let proof = ProofBuilder::default().signed_attestation(&t, &signer);

        let tampered = capital_transcript("Lyon", provenance);
        assert_eq!(
            verify(&tampered, &proof, &PinnedKey(signer.public_key_bytes())),
            VerificationOutcome::invalid(FailureReason::DigestMismatch)
        );
    }

    #[test]
    fn test_replaced_digest_with_valid_hex_breaks_signature() {
        // Attacker re-binds the artifact to a forged transcript by swapping
        // the digest; the signature no longer matches.
        let signer = SigningMaterial::generate();
        let provenance = ProvenanceMetadata::stamp("demo-model", "1.0");
        let t = capital_transcript("Paris", provenance.clone());
        let mut proof = ProofBuilder::default().signed_attestation(&t, &signer);

        let forged = capital_transcript("Lyon", provenance);
        proof.digest = ProofBuilder::default().digest_binding(&forged).digest;

        assert_eq!(
            verify(&forged, &proof, &PinnedKey(signer.public_key_bytes())),
            VerificationOutcome::invalid(FailureReason::SignatureInvalid)
        );
    }

    #[test]
    fn test_unknown_version_kind_and_algorithm() {
        let t = capital_transcript("Paris", ProvenanceMetadata::stamp("demo-model", "1.0"));
        let base = ProofBuilder::default().digest_binding(&t);
        let unknown = VerificationOutcome::invalid(FailureReason::UnknownAlgorithm);

        let mut p = base.clone();
        p.format_version = FORMAT_VERSION + 1;
        assert_eq!(verify(&t, &p, &NoTrust), unknown);

        let mut p = base.clone();
        p.kind = "zk-snark".to_string();
        assert_eq!(verify(&t, &p, &NoTrust), unknown);

        let mut p = base;
        p.digest_algorithm = "md5".to_string();
        assert_eq!(verify(&t, &p, &NoTrust), unknown);
    }

    #[test]
    fn test_unknown_signature_scheme() {
        let signer = SigningMaterial::generate();
        let t = capital_transcript("Paris", ProvenanceMetadata::stamp("demo-model", "1.0"));
        let mut proof = ProofBuilder::default().signed_attestation(&t, &signer);
        if let Some(sig) = proof.signature.as_mut() {
            sig.scheme = "dilithium3".to_string();
        }
        assert_eq!(
            verify(&t, &proof, &PinnedKey(signer.public_key_bytes())),
            VerificationOutcome::invalid(FailureReason::UnknownAlgorithm)
        );
    }

    #[test]
    fn test_malformed_fields_are_outcomes_not_panics() {
        let signer = SigningMaterial::generate();
        let t = capital_transcript("Paris", ProvenanceMetadata::stamp("demo-model", "1.0"));

        let mut p = ProofBuilder::default().digest_binding(&t);
        p.digest = "not hex".to_string();
        assert_eq!(
            verify(&t, &p, &NoTrust),
            VerificationOutcome::invalid(FailureReason::DigestMismatch)
        );

        let trust = PinnedKey(signer.public_key_bytes());
        let mut p = ProofBuilder::default().signed_attestation(&t, &signer);
        p.signature = Some(SignatureBlock {
            scheme: "ed25519".to_string(),
            key_id: signer.key_id(),
            signature: "abcd".to_string(),
        });
        assert_eq!(
            verify(&t, &p, &trust),
            VerificationOutcome::invalid(FailureReason::SignatureInvalid)
        );

        let mut p = ProofBuilder::default().signed_attestation(&t, &signer);
        p.signature = None;
        assert_eq!(
            verify(&t, &p, &trust),
            VerificationOutcome::invalid(FailureReason::SignatureInvalid)
        );
    }

    #[test]
    fn test_verify_claim_reconstructs_transcript() {
        let params = vec![GenerationParam::new("temperature", 0.0)];
        let req = canonicalize("What is the capital of France?", &params).unwrap();
        let t = Transcript::record(req, "Paris", ProvenanceMetadata::stamp("demo-model", "1.0"))
            .unwrap();
        let proof = ProofBuilder::default().digest_binding(&t);
        let result = GenerationResult::assemble(&t, &proof);

        // Same logical request, different surface form.
        let same = vec![GenerationParam::new("TEMPERATURE", -0.0)];
        assert!(verify_claim("What is the capital of France?\r\n", &same, &result, &NoTrust).is_valid());

        let other = vec![GenerationParam::new("temperature", 1.0)];
        assert_eq!(
            verify_claim("What is the capital of France?", &other, &result, &NoTrust),
            VerificationOutcome::invalid(FailureReason::DigestMismatch)
        );
        assert_eq!(
            verify_claim("", &[], &result, &NoTrust),
            VerificationOutcome::invalid(FailureReason::DigestMismatch)
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_string(&VerificationOutcome::valid()).unwrap();
        assert_eq!(json, r#"{"valid":true}"#);
        let json =
            serde_json::to_string(&VerificationOutcome::invalid(FailureReason::UnresolvedKey))
                .unwrap();
        assert_eq!(json, r#"{"valid":false,"reason":"unresolved_key"}"#);
    }
}
