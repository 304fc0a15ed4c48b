// crates/veritext-engine/src/adapter/ollama.rs
//
// Adapter for an Ollama server (`POST {endpoint}/api/generate`).
//
// One HTTP attempt per invocation; retries belong to the engine so that
// they are bounded by the caller's deadline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use veritext_core::error::VeritextError;
use veritext_core::provenance::ProvenanceMetadata;
use veritext_core::request::RequestDescriptor;
use veritext_core::traits::{ModelAdapter, ModelOutput};

/// Default Ollama API endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Per-request HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct OllamaAdapter {
    endpoint: String,
    model: String,
    model_version: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    options: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaAdapter {
    /// Adapter for `model` (e.g. "llama3:8b") served at `endpoint`.
    ///
    /// The reported model version is the tag after ':' ("latest" if the
    /// name has no tag) until overridden with `with_model_version`.
    ///
    /// # Errors
    /// `GenerationUnavailable` if the HTTP client cannot be constructed
    /// (for example when no TLS backend can be initialised).
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, VeritextError> {
        let model = model.into();
        let model_version = model
            .split_once(':')
            .map(|(_, tag)| tag.to_string())
            .filter(|tag| !tag.is_empty())
            .unwrap_or_else(|| "latest".to_string());

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model,
            model_version,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, VeritextError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = version.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, VeritextError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            VeritextError::GenerationUnavailable(format!("cannot build HTTP client: {}", e))
        })
}

/// Generation parameters become Ollama `options`, keyed by canonical name.
fn options_for(request: &RequestDescriptor) -> serde_json::Map<String, serde_json::Value> {
    request
        .params()
        .iter()
        .filter_map(|param| {
            serde_json::to_value(&param.value)
                .ok()
                .map(|value| (param.name.clone(), value))
        })
        .collect()
}

fn classify_status(status: StatusCode, body: &str) -> VeritextError {
    let detail = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body.trim())
    };

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        VeritextError::GenerationUnavailable(detail)
    } else {
        VeritextError::GenerationRejected(detail)
    }
}

#[async_trait]
impl ModelAdapter for OllamaAdapter {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }

    async fn invoke(&self, request: &RequestDescriptor) -> Result<ModelOutput, VeritextError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            prompt: request.prompt(),
            stream: false,
            options: options_for(request),
        };

        tracing::debug!(url = %url, model = %self.model, "Calling Ollama");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                VeritextError::GenerationUnavailable(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            VeritextError::GenerationUnavailable(format!("malformed Ollama response: {}", e))
        })?;

        Ok(ModelOutput {
            content: parsed.response,
            provenance: ProvenanceMetadata::stamp(&self.model, &self.model_version),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use veritext_core::request::{canonicalize, GenerationParam};

    /// Serve exactly one HTTP response and hand back the raw request.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    #[test]
    fn test_version_from_model_tag() {
        let tagged = OllamaAdapter::new(DEFAULT_ENDPOINT, "llama3:8b").unwrap();
        assert_eq!(tagged.model_version(), "8b");
        let untagged = OllamaAdapter::new(DEFAULT_ENDPOINT, "mistral").unwrap();
        assert_eq!(untagged.model_version(), "latest");
        let pinned = untagged.with_model_version("7.0.1");
        assert_eq!(pinned.model_version(), "7.0.1");
        let adapter = OllamaAdapter::new("http://host:1/", "m").unwrap();
        assert_eq!(adapter.endpoint(), "http://host:1");
    }

    #[tokio::test]
    async fn test_successful_generation_forwards_options() {
        let (endpoint, server) =
            one_shot_server("200 OK", r#"{"response":"Paris","done":true}"#).await;
        let adapter = OllamaAdapter::new(endpoint, "llama3:8b").unwrap();
        let request = canonicalize(
            "What is the capital of France?",
            &[GenerationParam::new("temperature", 0.2), GenerationParam::new("seed", 7i64)],
        )
        .unwrap();

        let output = adapter.invoke(&request).await.unwrap();
        assert_eq!(output.content, "Paris");
        assert_eq!(output.provenance.model_id, "llama3:8b");
        assert_eq!(output.provenance.model_version, "8b");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/generate"));
        assert!(raw.contains(r#""stream":false"#));
        assert!(raw.contains(r#""seed":7"#));
        assert!(raw.contains(r#""temperature":0.2"#));
    }

    #[tokio::test]
    async fn test_missing_model_is_rejected() {
        let (endpoint, _server) =
            one_shot_server("404 Not Found", r#"{"error":"model not found"}"#).await;
        let adapter = OllamaAdapter::new(endpoint, "nope").unwrap();
        let request = canonicalize("hi", &[]).unwrap();

        let err = adapter.invoke(&request).await.unwrap_err();
        assert!(matches!(err, VeritextError::GenerationRejected(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let (endpoint, _server) = one_shot_server("503 Service Unavailable", "").await;
        let adapter = OllamaAdapter::new(endpoint, "m").unwrap();
        let request = canonicalize("hi", &[]).unwrap();

        let err = adapter.invoke(&request).await.unwrap_err();
        assert!(matches!(err, VeritextError::GenerationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let (endpoint, _server) = one_shot_server("200 OK", r#"{"unexpected":1}"#).await;
        let adapter = OllamaAdapter::new(endpoint, "m").unwrap();
        let request = canonicalize("hi", &[]).unwrap();

        let err = adapter.invoke(&request).await.unwrap_err();
        assert!(matches!(err, VeritextError::GenerationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let adapter = OllamaAdapter::new(format!("http://{}", addr), "m")
            .and_then(|a| a.with_timeout(Duration::from_secs(2)))
            .unwrap();
        let request = canonicalize("hi", &[]).unwrap();

        let err = adapter.invoke(&request).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            VeritextError::GenerationUnavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "bad option"),
            VeritextError::GenerationRejected(ref m) if m.contains("bad option")
        ));
    }

    #[tokio::test]
    #[ignore] // Requires a running Ollama instance
    async fn test_ollama_integration() {
        let adapter = OllamaAdapter::new(DEFAULT_ENDPOINT, "llama2").unwrap();
        let request = canonicalize("Say hello", &[]).unwrap();
        let output = adapter.invoke(&request).await.unwrap();
        assert!(!output.content.is_empty());
    }
}
