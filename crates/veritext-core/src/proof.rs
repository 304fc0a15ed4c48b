// crates/veritext-core/src/proof.rs
//
// ProofArtifact: the versioned, self-describing proof that travels with a
// GenerationResult. Built by veritext-verify's ProofBuilder, interpreted
// only by its verifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encoding::{CanonicalReader, CanonicalWriter, ARTIFACT_DOMAIN, ATTESTATION_DOMAIN};
use crate::error::VeritextError;

/// Current proof format version. Verifiers reject versions they do not know.
pub const FORMAT_VERSION: u16 = 1;

/// Kinds of proof this build can produce and check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProofKind {
    /// Integrity only: digest over the canonical transcript.
    DigestBinding,
    /// Integrity plus authorship: the digest binding signed by the engine key.
    SignedAttestation,
}

impl ProofKind {
    /// Wire tag stored in the artifact.
    pub fn tag(&self) -> &'static str {
        match self {
            ProofKind::DigestBinding => "digest-binding",
            ProofKind::SignedAttestation => "signed-attestation",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "digest-binding" => Some(ProofKind::DigestBinding),
            "signed-attestation" => Some(ProofKind::SignedAttestation),
            _ => None,
        }
    }
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ProofKind {
    type Err = VeritextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProofKind::from_tag(s)
            .ok_or_else(|| VeritextError::InvalidRequest(format!("unknown proof kind '{}'", s)))
    }
}

/// Signature carried by a signed attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Signature scheme identifier (e.g., "ed25519").
    pub scheme: String,
    /// Reference to the signer's public key, resolved by the verifier's
    /// trust context. Never the key material itself.
    pub key_id: String,
    /// Hex-encoded signature bytes.
    pub signature: String,
}

/// A proof binding a transcript to its content, model identity and time.
///
/// Kind and algorithm are kept as strings rather than enums so that an
/// artifact produced by a newer build still deserializes here and is
/// reported as `UnknownAlgorithm` instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub format_version: u16,
    pub kind: String,
    pub digest_algorithm: String,
    /// Hex-encoded digest of the canonical transcript.
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

impl ProofArtifact {
    /// The proof kind, if this build knows it.
    pub fn proof_kind(&self) -> Option<ProofKind> {
        ProofKind::from_tag(&self.kind)
    }

    /// Canonical byte encoding of the artifact itself.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut writer = CanonicalWriter::new(ARTIFACT_DOMAIN);
        writer
            .put_u16(self.format_version)
            .put_str(&self.kind)
            .put_str(&self.digest_algorithm)
            .put_str(&self.digest);
        match &self.signature {
            Some(sig) => {
                writer
                    .put_u8(1)
                    .put_str(&sig.scheme)
                    .put_str(&sig.key_id)
                    .put_str(&sig.signature);
            }
            None => {
                writer.put_u8(0);
            }
        }
        writer.finish()
    }

    /// Parse an artifact from its canonical encoding.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, VeritextError> {
        let mut reader = CanonicalReader::new(bytes, ARTIFACT_DOMAIN)?;
        let format_version = reader.get_u16()?;
        let kind = reader.get_str()?.to_string();
        let digest_algorithm = reader.get_str()?.to_string();
        let digest = reader.get_str()?.to_string();
        let signature = match reader.get_u8()? {
            0 => None,
            1 => Some(SignatureBlock {
                scheme: reader.get_str()?.to_string(),
                key_id: reader.get_str()?.to_string(),
                signature: reader.get_str()?.to_string(),
            }),
            other => {
                return Err(VeritextError::Serialization(format!(
                    "invalid signature presence byte {}",
                    other
                )))
            }
        };
        reader.finish()?;
        Ok(Self {
            format_version,
            kind,
            digest_algorithm,
            digest,
            signature,
        })
    }
}

/// The message a signed attestation signs: the digest binding plus the
/// key reference, under its own domain tag.
pub fn attestation_message(
    format_version: u16,
    digest_algorithm: &str,
    digest: &[u8],
    key_id: &str,
) -> Vec<u8> {
    let mut writer = CanonicalWriter::new(ATTESTATION_DOMAIN);
    writer
        .put_u16(format_version)
        .put_str(digest_algorithm)
        .put_bytes(digest)
        .put_str(key_id);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(signature: Option<SignatureBlock>) -> ProofArtifact {
        ProofArtifact {
            format_version: FORMAT_VERSION,
            kind: ProofKind::SignedAttestation.tag().to_string(),
            digest_algorithm: "sha-256".to_string(),
            digest: "ab".repeat(32),
            signature,
        }
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ProofKind::from_tag("digest-binding"), Some(ProofKind::DigestBinding));
        assert_eq!("signed-attestation".parse::<ProofKind>().unwrap(), ProofKind::SignedAttestation);
        assert!("zk-snark".parse::<ProofKind>().is_err());
        assert_eq!(
            serde_json::to_string(&ProofKind::DigestBinding).unwrap(),
            "\"digest-binding\""
        );
    }

    #[test]
    fn test_canonical_bytes_parse_back() {
        let artifact = sample(Some(SignatureBlock {
            scheme: "ed25519".to_string(),
            key_id: "ed25519:00".to_string(),
            signature: "cd".repeat(64),
        }));
        let bytes = artifact.to_canonical_bytes();
        assert_eq!(ProofArtifact::from_canonical_bytes(&bytes).unwrap(), artifact);
    }

    #[test]
    fn test_unknown_kind_still_deserializes() {
        let json = r#"{"format_version":9,"kind":"zk-snark","digest_algorithm":"poseidon","digest":"00"}"#;
        let artifact: ProofArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.proof_kind(), None);
        assert!(artifact.signature.is_none());
    }

    #[test]
    fn test_attestation_message_binds_key_id() {
        let a = attestation_message(1, "sha-256", &[1, 2, 3], "ed25519:aa");
        let b = attestation_message(1, "sha-256", &[1, 2, 3], "ed25519:bb");
        assert_ne!(a, b);
    }
}
