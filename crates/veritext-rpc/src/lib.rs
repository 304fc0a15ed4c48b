// crates/veritext-rpc/src/lib.rs
//
// veritext-rpc: JSON-RPC server and handlers for the Veritext engine.
//
// Methods: generate/text, proof/verify, node/health, node/info, keys/list.
// Envelopes are JSON over tonic's HTTP transport; see server.rs.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main server types for ergonomic access.
pub use error::RpcError;
pub use server::{JsonRpcRequest, JsonRpcResponse, RpcConfig, RpcService, VeritextRpcServer};
pub use server::CALL_PATH;
