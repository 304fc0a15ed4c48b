// crates/veritext-engine/src/adapter/mock.rs
//
// Deterministic adapter for tests, demos and development. No network calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use veritext_core::error::VeritextError;
use veritext_core::provenance::ProvenanceMetadata;
use veritext_core::request::RequestDescriptor;
use veritext_core::traits::{ModelAdapter, ModelOutput};

pub const DEMO_PROMPT: &str = "What is the capital of France?";
pub const DEMO_ANSWER: &str = "Paris";

/// What the mock does for a given prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    /// Fail with `GenerationUnavailable`.
    Unavailable(String),
    /// Fail with `GenerationRejected`.
    Rejected(String),
}

/// Mock model adapter.
///
/// Replies are looked up by canonical prompt. Prompts without a configured
/// reply get the default reply, or an echo of the prompt when there is none.
///
/// ```
/// use veritext_engine::adapter::MockAdapter;
///
/// let adapter = MockAdapter::new("test-model", "0.1").with_response("ping", "pong");
/// assert_eq!(adapter.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockAdapter {
    model_id: String,
    model_version: String,
    responses: HashMap<String, MockReply>,
    default_reply: Option<MockReply>,
    latency: Option<Duration>,
    transient_failures: Arc<AtomicUsize>,
    call_count: Arc<AtomicUsize>,
}

impl MockAdapter {
    pub fn new(model_id: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: model_version.into(),
            responses: HashMap::new(),
            default_reply: None,
            latency: None,
            transient_failures: Arc::new(AtomicUsize::new(0)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The demo model: "demo-model" version "1.0", which knows one answer.
    pub fn demo() -> Self {
        Self::demo_with_identity("demo-model", "1.0")
    }

    /// The demo replies under a different identity.
    pub fn demo_with_identity(
        model_id: impl Into<String>,
        model_version: impl Into<String>,
    ) -> Self {
        Self::new(model_id, model_version).with_response(DEMO_PROMPT, DEMO_ANSWER)
    }

    /// Reply `content` to `prompt`.
    pub fn with_response(mut self, prompt: impl Into<String>, content: impl Into<String>) -> Self {
        self.responses
            .insert(prompt.into(), MockReply::Text(content.into()));
        self
    }

    /// Reply to `prompt` with an arbitrary outcome.
    pub fn with_reply(mut self, prompt: impl Into<String>, reply: MockReply) -> Self {
        self.responses.insert(prompt.into(), reply);
        self
    }

    /// Outcome for prompts with no specific reply.
    pub fn with_default_reply(mut self, reply: MockReply) -> Self {
        self.default_reply = Some(reply);
        self
    }

    /// Sleep this long before every reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The first `n` invocations fail with `GenerationUnavailable`.
    pub fn failing_first(self, n: usize) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Number of invocations so far, shared across clones.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn take_transient_failure(&self) -> bool {
        self.transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::demo()
    }
}

#[async_trait]
impl ModelAdapter for MockAdapter {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }

    async fn invoke(&self, request: &RequestDescriptor) -> Result<ModelOutput, VeritextError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.take_transient_failure() {
            return Err(VeritextError::GenerationUnavailable(
                "mock backend temporarily unavailable".to_string(),
            ));
        }

        let reply = self
            .responses
            .get(request.prompt())
            .or(self.default_reply.as_ref())
            .cloned()
            .unwrap_or_else(|| MockReply::Text(request.prompt().to_string()));

        match reply {
            MockReply::Text(content) => Ok(ModelOutput {
                content,
                provenance: ProvenanceMetadata::stamp(&self.model_id, &self.model_version),
            }),
            MockReply::Unavailable(reason) => Err(VeritextError::GenerationUnavailable(reason)),
            MockReply::Rejected(reason) => Err(VeritextError::GenerationRejected(reason)),
        }
    }
}
