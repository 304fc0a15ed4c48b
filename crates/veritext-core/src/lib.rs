// crates/veritext-core/src/lib.rs
//
// veritext-core: Core types, canonical encoding, traits, and crypto
// primitives for Veritext proof-carrying generation.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It owns the data model (request descriptors, provenance, transcripts,
// proof artifacts, result envelopes), the one canonical byte encoding that
// every proof is computed over, and the error taxonomy.

pub mod crypto;
pub mod encoding;
pub mod error;
pub mod proof;
pub mod provenance;
pub mod request;
pub mod result;
pub mod traits;
pub mod transcript;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use veritext_core::Transcript;`

pub use crypto::{DigestAlgorithm, SigningMaterial};
pub use error::{ErrorKind, VeritextError};
pub use proof::{ProofArtifact, ProofKind, SignatureBlock, FORMAT_VERSION};
pub use provenance::ProvenanceMetadata;
pub use request::{canonicalize, Canonicalizer, GenerationParam, ParamValue, RequestDescriptor};
pub use result::GenerationResult;
pub use traits::{ModelAdapter, ModelOutput, TrustContext};
pub use transcript::Transcript;
