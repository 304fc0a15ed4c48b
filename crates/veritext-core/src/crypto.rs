// crates/veritext-core/src/crypto.rs

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use zeroize::Zeroizing;

use crate::error::VeritextError;

/// Identifier carried in signature blocks for Ed25519 signatures.
pub const ED25519_SCHEME: &str = "ed25519";

/// Collision-resistant digest functions a proof may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "sha-256")]
    Sha256,
    #[serde(rename = "sha-512")]
    Sha512,
}

impl DigestAlgorithm {
    /// Wire identifier stored in proof artifacts.
    pub fn id(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha-256",
            DigestAlgorithm::Sha512 => "sha-512",
        }
    }

    /// Resolve a wire identifier. Returns `None` for algorithms this build
    /// does not know, which verifiers report as `UnknownAlgorithm`.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "sha-256" => Some(DigestAlgorithm::Sha256),
            "sha-512" => Some(DigestAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Digest `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Sha256
    }
}

/// Process-wide Ed25519 signing key used for signed attestations.
///
/// Read-only after construction. The secret half never appears in `Debug`
/// output, and `ed25519_dalek` zeroizes it on drop.
pub struct SigningMaterial {
    signing_key: SigningKey,
}

impl SigningMaterial {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build from raw 32-byte secret key bytes.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Build from a hex-encoded 32-byte secret (the on-disk key file format).
    /// Decoded bytes are wiped before returning.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, VeritextError> {
        let bytes = Zeroizing::new(hex::decode(secret_hex.trim())?);
        if bytes.len() != 32 {
            return Err(VeritextError::Crypto(
                "Secret key must be exactly 32 bytes".to_string(),
            ));
        }
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&bytes);
        Ok(Self::from_secret_bytes(&secret))
    }

    /// Secret key bytes, for writing key files. Wiped when dropped.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// The public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Key reference placed in signed artifacts.
    pub fn key_id(&self) -> String {
        key_id(&self.public_key_bytes())
    }

    /// Sign a message and return the 64 signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("key_id", &self.key_id())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Derive the key reference for a public key: `ed25519:` followed by the
/// first 16 bytes of SHA-256(public key), hex-encoded.
pub fn key_id(public_key: &[u8; 32]) -> String {
    let fingerprint = hash_bytes(public_key);
    format!("{}:{}", ED25519_SCHEME, hex::encode(&fingerprint[..16]))
}

/// Parse a hex-encoded Ed25519 public key.
pub fn parse_public_key_hex(public_key_hex: &str) -> Result<[u8; 32], VeritextError> {
    let bytes = hex::decode(public_key_hex.trim())?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        VeritextError::Crypto("Public key must be exactly 32 bytes".to_string())
    })?;
    VerifyingKey::from_bytes(&key)?;
    Ok(key)
}

/// Verify an Ed25519 signature.
///
/// Returns `Ok(true)` if the signature is valid for the message and key,
/// `Ok(false)` if it is not, and an error only when the key or signature
/// bytes are structurally unusable.
pub fn verify_signature(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, VeritextError> {
    let verifying_key = VerifyingKey::from_bytes(public_key_bytes)
        .map_err(|e| VeritextError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| VeritextError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Compute SHA-256 hash of the given bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Sha256::digest(data));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let material = SigningMaterial::generate();
        let message = b"paris is the capital";

        let signature = material.sign(message);
        let pubkey = material.public_key_bytes();

        assert!(verify_signature(&pubkey, message, &signature).unwrap());
        assert!(!verify_signature(&pubkey, b"lyon is the capital", &signature).unwrap());
    }

    #[test]
    fn test_short_signature_is_an_error() {
        let material = SigningMaterial::generate();
        let result = verify_signature(&material.public_key_bytes(), b"m", &[0u8; 10]);
        assert!(matches!(result, Err(VeritextError::Crypto(_))));
    }

    #[test]
    fn test_secret_hex_roundtrip_keeps_identity() {
        let material = SigningMaterial::generate();
        let secret_hex = hex::encode(material.secret_bytes().as_slice());
        let restored = SigningMaterial::from_secret_hex(&secret_hex).unwrap();
        assert_eq!(material.public_key_bytes(), restored.public_key_bytes());
        assert_eq!(material.key_id(), restored.key_id());
    }

    #[test]
    fn test_secret_hex_must_be_32_bytes() {
        let short = hex::encode([1u8; 31]);
        assert!(matches!(
            SigningMaterial::from_secret_hex(&short),
            Err(VeritextError::Crypto(_))
        ));
        assert!(SigningMaterial::from_secret_hex("not hex").is_err());

        let material = SigningMaterial::from_secret_bytes(&[9u8; 32]);
        let secret: Zeroizing<[u8; 32]> = material.secret_bytes();
        assert_eq!(*secret, [9u8; 32]);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let material = SigningMaterial::generate();
        let rendered = format!("{:?}", material);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&hex::encode(material.secret_bytes().as_slice())));
    }

    #[test]
    fn test_key_id_shape() {
        let material = SigningMaterial::generate();
        let id = material.key_id();
        assert!(id.starts_with("ed25519:"));
        assert_eq!(id.len(), "ed25519:".len() + 32);
    }

    #[test]
    fn test_digest_algorithm_ids() {
        assert_eq!(DigestAlgorithm::from_id("sha-256"), Some(DigestAlgorithm::Sha256));
        assert_eq!(DigestAlgorithm::from_id("sha-512"), Some(DigestAlgorithm::Sha512));
        assert_eq!(DigestAlgorithm::from_id("md5"), None);
        assert_eq!(DigestAlgorithm::Sha256.digest(b"x").len(), 32);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"x").len(), 64);
    }

    #[test]
    fn test_parse_public_key_hex_rejects_wrong_length() {
        assert!(parse_public_key_hex("abcd").is_err());
        let material = SigningMaterial::generate();
        let parsed = parse_public_key_hex(&hex::encode(material.public_key_bytes())).unwrap();
        assert_eq!(parsed, material.public_key_bytes());
    }
}
