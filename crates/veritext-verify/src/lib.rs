// crates/veritext-verify/src/lib.rs
//
// veritext-verify: proof construction and verification for Veritext.
//
// The builder turns a Transcript into a ProofArtifact; the verifier checks
// a (Transcript, ProofArtifact) pair against a caller-supplied trust
// context. Nothing here performs I/O except KeyRegistry::load_from_yaml.

pub mod builder;
pub mod keys;
pub mod verifier;

// Re-export key types for ergonomic access from downstream crates.
pub use builder::ProofBuilder;
pub use keys::{KeyRegistry, TrustedKey};
pub use verifier::{verify, verify_claim, FailureReason, NoTrust, PinnedKey, VerificationOutcome};
