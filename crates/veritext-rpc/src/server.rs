// crates/veritext-rpc/src/server.rs
//
// RPC server setup: VeritextRpcServer and RpcConfig.
//
// JSON-RPC over tonic's transport. A single hand-wired service accepts
// JSON-encoded `{method, params}` envelopes, dispatches to the matching
// handler, and answers with `{success, result, error}`. No proto codegen.
//
// Clients POST to `CALL_PATH`; HTTP/1.1 is accepted so plain JSON clients
// (curl, reqwest) work without gRPC framing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use tonic::transport::Server;
use tonic::Status;
use tracing::Instrument;

use veritext_engine::ProofEngine;
use veritext_verify::KeyRegistry;

use crate::error::RpcError;
use crate::handlers;
use crate::middleware::{self, RequestId};

/// Service name used for routing.
pub const SERVICE_NAME: &str = "veritext.rpc.VeritextService";

/// Path that JSON-RPC envelopes are POSTed to.
pub const CALL_PATH: &str = "/veritext.rpc.VeritextService/Call";

/// Request bodies above this size are refused without being parsed.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "generate/text", "proof/verify").
    pub method: String,
    /// JSON-encoded parameters for the method; `null` means none. Objects
    /// that repeat a key are rejected at any depth.
    #[serde(default, deserialize_with = "unique_keys")]
    pub params: serde_json::Value,
}

/// Deserialize a JSON value, failing on objects with a repeated key.
///
/// `serde_json::Value` keeps the last occurrence, which would let a
/// request carry one parameter value into the handler and another to
/// anything that reads the raw body.
fn unique_keys<'de, D>(deserializer: D) -> Result<serde_json::Value, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(UniqueKeysVisitor)
}

struct UniqueKeys(serde_json::Value);

impl<'de> Deserialize<'de> for UniqueKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        unique_keys(deserializer).map(UniqueKeys)
    }
}

struct UniqueKeysVisitor;

impl<'de> Visitor<'de> for UniqueKeysVisitor {
    type Value = serde_json::Value;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a JSON value without repeated object keys")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(serde_json::Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(serde_json::Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        unique_keys(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(serde_json::Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(serde_json::Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(serde_json::Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(serde_json::Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(serde_json::Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(serde_json::Value::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(UniqueKeys(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(serde_json::Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut object = serde_json::Map::new();
        while let Some(key) = access.next_key::<String>()? {
            if object.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key '{}'", key)));
            }
            let UniqueKeys(value) = access.next_value()?;
            object.insert(key, value);
        }
        Ok(serde_json::Value::Object(object))
    }
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// The result data (if success).
    pub result: Option<serde_json::Value>,
    /// Structured error (if not success).
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    pub fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(value),
            error: None,
        }
    }

    pub fn err(error: RpcError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// VeritextRpcServer
// ---------------------------------------------------------------------------

/// The RPC server: binds an address and serves `RpcService`.
#[derive(Clone)]
pub struct VeritextRpcServer {
    config: RpcConfig,
    service: RpcService,
}

impl std::fmt::Debug for VeritextRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VeritextRpcServer")
            .field("config", &self.config)
            .field("trusted_keys", &self.service.trust.len())
            .finish()
    }
}

impl VeritextRpcServer {
    /// Create a new server around a shared engine and the keys its verify
    /// endpoint trusts.
    pub fn new(config: RpcConfig, engine: Arc<ProofEngine>, trust: Arc<KeyRegistry>) -> Self {
        Self {
            config,
            service: RpcService::new(engine, trust),
        }
    }

    /// Start the RPC server and serve requests until the process exits.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Veritext RPC server starting on {}{}", addr, CALL_PATH);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                VeritextJsonRpcServer::new(self.service.clone()),
                middleware::logging_interceptor,
            ))
            .serve(addr)
            .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Shared state behind every request, and the method dispatcher.
#[derive(Clone)]
pub struct RpcService {
    engine: Arc<ProofEngine>,
    trust: Arc<KeyRegistry>,
    started_at: DateTime<Utc>,
}

impl RpcService {
    pub fn new(engine: Arc<ProofEngine>, trust: Arc<KeyRegistry>) -> Self {
        Self {
            engine,
            trust,
            started_at: Utc::now(),
        }
    }

    /// Dispatch a JSON-RPC request to the handler for its method.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = match request.method.as_str() {
            "generate/text" => {
                let engine = self.engine.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::generate::handle_generate_text(&engine, r).await
                })
                .await
            }
            "proof/verify" => {
                let trust = self.trust.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::verify::handle_verify_proof(trust.as_ref(), r).await
                })
                .await
            }
            "node/health" => {
                let engine = self.engine.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::node::handle_get_health(r, &engine).await
                })
                .await
            }
            "node/info" => {
                let engine = self.engine.clone();
                let started_at = self.started_at;
                dispatch_handler(request.params, |r| async move {
                    handlers::node::handle_get_node_info(r, &engine, started_at).await
                })
                .await
            }
            "keys/list" => {
                let trust = self.trust.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::keys::handle_list_keys(r, &trust).await
                })
                .await
            }
            _ => Err(RpcError::invalid_request(format!(
                "Unknown method: {}",
                request.method
            ))),
        };

        match result {
            Ok(value) => JsonRpcResponse::ok(value),
            Err(err) => JsonRpcResponse::err(err),
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, RpcError>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Result<Resp, RpcError>>,
{
    let params = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| RpcError::invalid_request(format!("Failed to deserialize request: {}", e)))?;
    let response = handler(request).await?;
    serde_json::to_value(response)
        .map_err(|e| RpcError::internal(format!("Failed to serialize response: {}", e)))
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------

/// The tonic service wrapper: reads the body, decodes the envelope and
/// dispatches.
#[derive(Clone)]
pub struct VeritextJsonRpcServer {
    inner: RpcService,
}

impl std::fmt::Debug for VeritextJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VeritextJsonRpcServer").finish()
    }
}

impl VeritextJsonRpcServer {
    pub fn new(inner: RpcService) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for VeritextJsonRpcServer {
    const NAME: &'static str = SERVICE_NAME;
}

impl<B> tower_service::Service<http::Request<B>> for VeritextJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .copied()
            .unwrap_or_default();
        let span = tracing::info_span!("rpc", request_id = %request_id);

        Box::pin(
            async move {
                let body_bytes = match collect_body(req.into_body(), MAX_BODY_BYTES).await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::warn!("Failed to read request body: {}", e);
                        let resp = JsonRpcResponse::err(RpcError::invalid_request(format!(
                            "Failed to read request body: {}",
                            e
                        )));
                        return Ok(build_response(&resp, request_id));
                    }
                };

                let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                    Ok(r) => r,
                    Err(e) => {
                        let resp = JsonRpcResponse::err(RpcError::invalid_request(format!(
                            "Invalid JSON-RPC request: {}",
                            e
                        )));
                        return Ok(build_response(&resp, request_id));
                    }
                };

                tracing::info!(method = %rpc_request.method, "Dispatching");
                let rpc_response = inner.dispatch(rpc_request).await;
                Ok(build_response(&rpc_response, request_id))
            }
            .instrument(span),
        )
    }
}

/// Collect the body of an HTTP request, refusing more than `limit` bytes.
async fn collect_body<B>(body: B, limit: usize) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    if collected.len() + data.remaining() > limit {
                        return Err(format!("body exceeds {} bytes", limit));
                    }
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build an HTTP response carrying the JSON envelope.
fn build_response(
    envelope: &JsonRpcResponse,
    request_id: RequestId,
) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(envelope).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    if let Ok(value) = http::HeaderValue::from_str(&request_id.to_string()) {
        headers.insert("x-request-id", value);
    }
    response
}
