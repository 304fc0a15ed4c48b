// crates/veritext-engine/src/engine.rs
//
// ProofEngine: canonicalize -> invoke (deadline, bounded retry) -> record
// -> build proof -> assemble. Constructed once and shared through Arc.

use std::sync::Arc;
use std::time::{Duration, Instant};

use veritext_core::crypto::SigningMaterial;
use veritext_core::error::VeritextError;
use veritext_core::proof::ProofKind;
use veritext_core::request::{Canonicalizer, GenerationParam, RequestDescriptor};
use veritext_core::result::GenerationResult;
use veritext_core::traits::{ModelAdapter, ModelOutput};
use veritext_core::transcript::Transcript;
use veritext_verify::builder::ProofBuilder;

use crate::config::EngineConfig;

/// Per-request overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Proof kind; the engine default when `None`.
    pub proof_kind: Option<ProofKind>,
    /// Deadline for the model call; the engine default when `None`.
    pub deadline: Option<Duration>,
}

impl GenerateOptions {
    pub fn with_proof_kind(mut self, kind: ProofKind) -> Self {
        self.proof_kind = Some(kind);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// The proof-carrying generation engine.
pub struct ProofEngine {
    adapter: Arc<dyn ModelAdapter>,
    signing: Option<Arc<SigningMaterial>>,
    canonicalizer: Canonicalizer,
    builder: ProofBuilder,
    config: EngineConfig,
}

impl ProofEngine {
    pub fn new(adapter: Arc<dyn ModelAdapter>, config: EngineConfig) -> Self {
        Self {
            adapter,
            signing: None,
            canonicalizer: Canonicalizer::new(config.max_prompt_chars),
            builder: ProofBuilder::new(config.digest_algorithm),
            config,
        }
    }

    /// Inject the engine's signing key. Required for signed attestations.
    pub fn with_signing_material(mut self, material: SigningMaterial) -> Self {
        self.signing = Some(Arc::new(material));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model_id(&self) -> &str {
        self.adapter.model_id()
    }

    pub fn model_version(&self) -> &str {
        self.adapter.model_version()
    }

    pub fn signing_enabled(&self) -> bool {
        self.signing.is_some()
    }

    /// Key reference that signed attestations from this engine carry.
    pub fn signer_key_id(&self) -> Option<String> {
        self.signing.as_ref().map(|m| m.key_id())
    }

    pub fn signer_public_key(&self) -> Option<[u8; 32]> {
        self.signing.as_ref().map(|m| m.public_key_bytes())
    }

    /// Generate content with the default proof kind and deadline.
    pub async fn generate_verifiable_text(
        &self,
        prompt: &str,
        params: &[GenerationParam],
    ) -> Result<GenerationResult, VeritextError> {
        self.generate(prompt, params, GenerateOptions::default())
            .await
    }

    /// Generate content and a proof binding it to the request, the model
    /// and the time of generation.
    ///
    /// # Errors
    /// - `InvalidRequest` if the prompt or parameters fail canonicalization.
    /// - `SigningUnavailable` if a signed proof is requested without a key;
    ///   checked before the model is called.
    /// - `GenerationUnavailable` if the model keeps failing transiently or
    ///   the deadline passes.
    /// - `GenerationRejected` if the model refuses the request.
    pub async fn generate(
        &self,
        prompt: &str,
        params: &[GenerationParam],
        options: GenerateOptions,
    ) -> Result<GenerationResult, VeritextError> {
        let kind = options
            .proof_kind
            .unwrap_or(self.config.default_proof_kind);
        if kind == ProofKind::SignedAttestation && self.signing.is_none() {
            return Err(VeritextError::SigningUnavailable(
                "signed attestation requested but no signing key is configured".to_string(),
            ));
        }

        let request = self.canonicalizer.canonicalize(prompt, params)?;
        tracing::info!(
            prompt_chars = request.prompt().chars().count(),
            params = request.params().len(),
            proof_kind = %kind,
            "Accepted generation request"
        );

        let deadline = options.deadline.unwrap_or_else(|| self.config.deadline());
        let started = Instant::now();
        let output = match tokio::time::timeout(deadline, self.invoke_with_retry(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    "Model invocation exceeded deadline"
                );
                return Err(VeritextError::GenerationUnavailable(format!(
                    "model did not respond within {} ms",
                    deadline.as_millis()
                )));
            }
        };
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            content_len = output.content.len(),
            "Model invocation finished"
        );

        let transcript = Transcript::record(request, output.content, output.provenance)?;
        let proof = self
            .builder
            .build(&transcript, kind, self.signing.as_deref())?;
        tracing::info!(
            proof_kind = %kind,
            digest = %digest_prefix(&proof.digest),
            model = %transcript.provenance().model_id,
            "Built proof"
        );

        Ok(GenerationResult::assemble(&transcript, &proof))
    }

    async fn invoke_with_retry(
        &self,
        request: &RequestDescriptor,
    ) -> Result<ModelOutput, VeritextError> {
        let policy = &self.config.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.adapter.invoke(request).await {
                Ok(output) => return Ok(output),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = policy.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Model unavailable, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(attempt, "Model invocation failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

fn digest_prefix(digest: &str) -> &str {
    digest.get(..16).unwrap_or(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::{MockAdapter, MockReply};
    use crate::config::RetryPolicy;

    fn fast_retry(max_attempts: u32) -> EngineConfig {
        EngineConfig {
            retry: RetryPolicy {
                max_attempts,
                initial_backoff_ms: 1,
                max_backoff_ms: 2,
            },
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let adapter = MockAdapter::demo().failing_first(2);
        let engine = ProofEngine::new(Arc::new(adapter.clone()), fast_retry(3));

        let result = engine
            .generate_verifiable_text("What is the capital of France?", &[])
            .await
            .unwrap();
        assert_eq!(result.content, "Paris");
        assert_eq!(adapter.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let adapter = MockAdapter::demo().failing_first(10);
        let engine = ProofEngine::new(Arc::new(adapter.clone()), fast_retry(2));

        let err = engine.generate_verifiable_text("hi", &[]).await.unwrap_err();
        assert!(matches!(err, VeritextError::GenerationUnavailable(_)));
        assert_eq!(adapter.call_count(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_one_attempt() {
        let adapter = MockAdapter::demo().failing_first(1);
        let config = EngineConfig {
            retry: RetryPolicy::none(),
            ..EngineConfig::default()
        };
        let engine = ProofEngine::new(Arc::new(adapter.clone()), config);

        let err = engine.generate_verifiable_text("hi", &[]).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(adapter.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let adapter = MockAdapter::new("m", "1")
            .with_default_reply(MockReply::Rejected("refused".into()));
        let engine = ProofEngine::new(Arc::new(adapter.clone()), fast_retry(5));

        let err = engine.generate_verifiable_text("hi", &[]).await.unwrap_err();
        assert_eq!(err, VeritextError::GenerationRejected("refused".into()));
        assert_eq!(adapter.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_model() {
        let adapter = MockAdapter::demo();
        let engine = ProofEngine::new(Arc::new(adapter.clone()), EngineConfig::default());

        let err = engine.generate_verifiable_text(" \r\n ", &[]).await.unwrap_err();
        assert!(matches!(err, VeritextError::InvalidRequest(_)));
        assert_eq!(adapter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_limit_comes_from_config() {
        let config = EngineConfig {
            max_prompt_chars: 4,
            ..EngineConfig::default()
        };
        let engine = ProofEngine::new(Arc::new(MockAdapter::demo()), config);

        assert!(engine.generate_verifiable_text("abcd", &[]).await.is_ok());
        let err = engine.generate_verifiable_text("abcde", &[]).await.unwrap_err();
        assert!(matches!(err, VeritextError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_model_call() {
        let adapter = MockAdapter::demo();
        let engine = ProofEngine::new(Arc::new(adapter.clone()), EngineConfig::default());

        let options = GenerateOptions::default().with_proof_kind(ProofKind::SignedAttestation);
        let err = engine.generate("hi", &[], options).await.unwrap_err();
        assert!(matches!(err, VeritextError::SigningUnavailable(_)));
        assert_eq!(adapter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_default_proof_kind_from_config() {
        let config = EngineConfig {
            default_proof_kind: ProofKind::SignedAttestation,
            ..EngineConfig::default()
        };
        let engine = ProofEngine::new(Arc::new(MockAdapter::demo()), config)
            .with_signing_material(SigningMaterial::generate());

        let result = engine.generate_verifiable_text("hi", &[]).await.unwrap();
        assert_eq!(result.proof.proof_kind(), Some(ProofKind::SignedAttestation));
        let block = result.proof.signature.as_ref().unwrap();
        assert_eq!(Some(block.key_id.clone()), engine.signer_key_id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_covers_retries() {
        let adapter = MockAdapter::demo().failing_first(100);
        let config = EngineConfig {
            retry: RetryPolicy {
                max_attempts: 100,
                initial_backoff_ms: 1_000,
                max_backoff_ms: 1_000,
            },
            ..EngineConfig::default()
        };
        let engine = ProofEngine::new(Arc::new(adapter.clone()), config);

        let options = GenerateOptions::default().with_deadline(Duration::from_millis(2_500));
        let err = engine.generate("hi", &[], options).await.unwrap_err();
        assert!(matches!(err, VeritextError::GenerationUnavailable(_)));
        assert_eq!(adapter.call_count(), 3);
    }

    #[test]
    fn test_digest_prefix() {
        assert_eq!(digest_prefix("0123456789abcdef0123"), "0123456789abcdef");
        assert_eq!(digest_prefix("abc"), "abc");
    }
}
