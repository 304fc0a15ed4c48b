// crates/veritext-engine/src/config.rs
//
// Engine configuration. Deserialized from the `[engine]` and `[model]`
// tables of the daemon's TOML file, or built in code with defaults.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use veritext_core::crypto::DigestAlgorithm;
use veritext_core::error::VeritextError;
use veritext_core::proof::ProofKind;
use veritext_core::request::DEFAULT_MAX_PROMPT_CHARS;
use veritext_core::traits::ModelAdapter;

use crate::adapter::mock::MockAdapter;
use crate::adapter::ollama::OllamaAdapter;

/// Bounded exponential backoff for transient model failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `1` disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for a single delay; delays double until they reach it.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// No retries: one attempt only.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        let delay = self.initial_backoff_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }
}

/// Runtime knobs of the generation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Longest accepted prompt, in Unicode scalar values.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Proof kind used when a request does not name one.
    #[serde(default = "default_proof_kind")]
    pub default_proof_kind: ProofKind,

    /// Digest algorithm for new proofs.
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,

    /// Deadline for the model call (all attempts together) when the caller
    /// does not supply one.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_max_prompt_chars() -> usize {
    DEFAULT_MAX_PROMPT_CHARS
}

fn default_proof_kind() -> ProofKind {
    ProofKind::DigestBinding
}

fn default_deadline_ms() -> u64 {
    30_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
            default_proof_kind: default_proof_kind(),
            digest_algorithm: DigestAlgorithm::default(),
            deadline_ms: default_deadline_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Which backing model to construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum AdapterConfig {
    /// Deterministic canned responses (development and demos).
    Mock {
        #[serde(default = "default_mock_model_id")]
        model_id: String,
        #[serde(default = "default_mock_model_version")]
        model_version: String,
    },
    /// A local or remote Ollama server.
    Ollama {
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        model: String,
        /// Reported model version; derived from the model tag when absent.
        #[serde(default)]
        model_version: Option<String>,
        #[serde(default = "default_ollama_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_mock_model_id() -> String {
    "demo-model".to_string()
}

fn default_mock_model_version() -> String {
    "1.0".to_string()
}

fn default_ollama_endpoint() -> String {
    crate::adapter::ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_ollama_timeout_secs() -> u64 {
    crate::adapter::ollama::DEFAULT_TIMEOUT_SECS
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig::Mock {
            model_id: default_mock_model_id(),
            model_version: default_mock_model_version(),
        }
    }
}

impl AdapterConfig {
    /// Construct the configured adapter. The choice is fixed for the
    /// lifetime of the engine that receives it.
    pub fn build(&self) -> Result<Arc<dyn ModelAdapter>, VeritextError> {
        match self {
            AdapterConfig::Mock {
                model_id,
                model_version,
            } => Ok(Arc::new(MockAdapter::demo_with_identity(
                model_id.clone(),
                model_version.clone(),
            ))),
            AdapterConfig::Ollama {
                endpoint,
                model,
                model_version,
                timeout_secs,
            } => {
                let mut adapter = OllamaAdapter::new(endpoint.clone(), model.clone())?
                    .with_timeout(Duration::from_secs(*timeout_secs))?;
                if let Some(version) = model_version {
                    adapter = adapter.with_model_version(version.clone());
                }
                Ok(Arc::new(adapter))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 300,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(300));
        assert_eq!(policy.backoff(40), Duration::from_millis(300));
    }

    #[test]
    fn test_engine_config_from_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            default_proof_kind = "signed-attestation"
            digest_algorithm = "sha-512"
            [retry]
            max_attempts = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.default_proof_kind, ProofKind::SignedAttestation);
        assert_eq!(config.digest_algorithm, DigestAlgorithm::Sha512);
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.initial_backoff_ms, 250);
        assert_eq!(config.max_prompt_chars, DEFAULT_MAX_PROMPT_CHARS);
        assert_eq!(config.deadline(), Duration::from_secs(30));
    }

    #[test]
    fn test_adapter_config_variants() {
        let mock: AdapterConfig = toml::from_str(r#"backend = "mock""#).unwrap();
        assert_eq!(mock, AdapterConfig::default());
        assert_eq!(mock.build().unwrap().model_id(), "demo-model");

        let ollama: AdapterConfig =
            toml::from_str("backend = \"ollama\"\nmodel = \"llama3:8b\"\n").unwrap();
        let adapter = ollama.build().unwrap();
        assert_eq!(adapter.model_id(), "llama3:8b");
        assert_eq!(adapter.model_version(), "8b");

        let pinned: AdapterConfig = toml::from_str(
            "backend = \"ollama\"\nmodel = \"mistral\"\nmodel_version = \"7.0.1\"\ntimeout_secs = 5\n",
        )
        .unwrap();
        assert_eq!(pinned.build().unwrap().model_version(), "7.0.1");
    }
}
