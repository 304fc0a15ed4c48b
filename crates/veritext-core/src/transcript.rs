// crates/veritext-core/src/transcript.rs
//
// Transcript: the immutable (request, content, provenance) record that
// proofs are built over.

use crate::encoding::{CanonicalWriter, TRANSCRIPT_DOMAIN};
use crate::error::VeritextError;
use crate::provenance::ProvenanceMetadata;
use crate::request::RequestDescriptor;

/// Immutable record of one generation invocation.
///
/// The canonical encoding is computed once at record time:
///
/// ```text
/// domain "veritext/transcript/v1"
/// request   len-prefixed RequestDescriptor encoding
/// content   len-prefixed UTF-8 bytes
/// model_id, model_version   len-prefixed UTF-8
/// timestamp i64 BE, milliseconds since the Unix epoch
/// nonce     len-prefixed UTF-8
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    request: RequestDescriptor,
    content: String,
    provenance: ProvenanceMetadata,
    encoded: Vec<u8>,
}

impl Transcript {
    /// Record a transcript.
    ///
    /// # Errors
    /// `InvalidRequest` if any provenance field is empty.
    pub fn record(
        request: RequestDescriptor,
        content: impl Into<String>,
        provenance: ProvenanceMetadata,
    ) -> Result<Self, VeritextError> {
        if provenance.model_id.trim().is_empty() {
            return Err(VeritextError::InvalidRequest(
                "provenance is missing a model identifier".to_string(),
            ));
        }
        if provenance.model_version.trim().is_empty() {
            return Err(VeritextError::InvalidRequest(
                "provenance is missing a model version".to_string(),
            ));
        }
        if provenance.nonce.is_empty() {
            return Err(VeritextError::InvalidRequest(
                "provenance is missing a nonce".to_string(),
            ));
        }

        let content = content.into();
        let mut writer = CanonicalWriter::new(TRANSCRIPT_DOMAIN);
        writer
            .put_bytes(request.canonical_bytes())
            .put_bytes(content.as_bytes());
        provenance.encode(&mut writer);

        Ok(Self {
            request,
            content,
            provenance,
            encoded: writer.finish(),
        })
    }

    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn provenance(&self) -> &ProvenanceMetadata {
        &self.provenance
    }

    /// The canonical serialization every proof is computed over.
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.encoded
    }
}
