// crates/veritext-core/src/traits.rs

use async_trait::async_trait;

use crate::error::VeritextError;
use crate::provenance::ProvenanceMetadata;
use crate::request::RequestDescriptor;

/// Raw output of one model invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutput {
    pub content: String,
    pub provenance: ProvenanceMetadata,
}

/// A backing generation service.
///
/// Implemented by veritext-engine (mock and Ollama adapters). One adapter is
/// chosen when the engine is constructed.
///
/// # Trust boundary
/// Implementations must stamp their own identity, version and time
/// truthfully. Proofs bind whatever provenance the adapter reports: a
/// verifier can detect tampering that happens *after* generation, but
/// cannot detect an adapter that lies about itself *at* generation.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Identifier of the backing model (e.g., "demo-model").
    fn model_id(&self) -> &str;

    /// Version of the backing model.
    fn model_version(&self) -> &str;

    /// Produce content for a canonical request.
    ///
    /// # Errors
    /// `GenerationUnavailable` for transient failures (network, overload),
    /// `GenerationRejected` when the backend refuses the request.
    async fn invoke(&self, request: &RequestDescriptor) -> Result<ModelOutput, VeritextError>;
}

/// Resolves key references found in signed artifacts to trusted public keys.
///
/// Deciding which keys deserve trust is the caller's business; the verifier
/// only asks this trait.
pub trait TrustContext: Send + Sync {
    /// The trusted Ed25519 public key for `key_id`, if any.
    fn resolve(&self, key_id: &str) -> Option<[u8; 32]>;
}
