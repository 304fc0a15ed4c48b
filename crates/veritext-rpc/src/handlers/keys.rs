// crates/veritext-rpc/src/handlers/keys.rs
//
// ListKeys: the public keys this service trusts when verifying.

use serde::{Deserialize, Serialize};

use veritext_verify::{KeyRegistry, TrustedKey};

use crate::error::RpcError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListKeysRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListKeysResponse {
    pub keys: Vec<TrustedKey>,
    pub count: usize,
}

/// Handle a ListKeys request.
pub async fn handle_list_keys(
    _request: ListKeysRequest,
    registry: &KeyRegistry,
) -> Result<ListKeysResponse, RpcError> {
    let keys: Vec<TrustedKey> = registry.list().into_iter().cloned().collect();
    let count = keys.len();
    Ok(ListKeysResponse { keys, count })
}
