// crates/veritext-rpc/src/middleware.rs
//
// Request interception for the RPC server: request ids and access logging.

use tonic::{Request, Status};
use uuid::Uuid;

/// Identifier attached to every incoming request. Echoed in log spans and
/// the `x-request-id` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Logging interceptor for incoming requests.
///
/// Assigns a `RequestId` (kept in the request extensions) and logs the
/// caller's user agent. Headers may carry credentials, so they are not
/// logged wholesale.
pub fn logging_interceptor(mut req: Request<()>) -> Result<Request<()>, Status> {
    let id = RequestId::new();
    let user_agent = req
        .metadata()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    tracing::info!(request_id = %id, user_agent = %user_agent, "Incoming RPC request");
    req.extensions_mut().insert(id);
    Ok(req)
}
