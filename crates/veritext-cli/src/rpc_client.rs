// crates/veritext-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the veritext-daemon endpoint.

use serde::de::DeserializeOwned;

use veritext_rpc::{JsonRpcRequest, JsonRpcResponse, CALL_PATH};

/// Send a JSON-RPC call to the daemon and return the parsed envelope.
pub async fn rpc_call(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<JsonRpcResponse, Box<dyn std::error::Error>> {
    let request = JsonRpcRequest {
        method: method.to_string(),
        params,
    };

    let url = format!("{}{}", endpoint.trim_end_matches('/'), CALL_PATH);
    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&request).send().await?;

    let rpc_response: JsonRpcResponse = resp.json().await?;
    Ok(rpc_response)
}

/// Call `method` and decode its result, turning a failed envelope into an
/// error that carries the server's `{kind, message, retryable}`.
pub async fn call_method<T: DeserializeOwned>(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<T, Box<dyn std::error::Error>> {
    let response = rpc_call(endpoint, method, params).await?;
    unwrap_envelope(response)
}

fn unwrap_envelope<T: DeserializeOwned>(
    response: JsonRpcResponse,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(err) = response.error {
        let hint = if err.retryable { " (retryable)" } else { "" };
        return Err(format!("{:?}: {}{}", err.kind, err.message, hint).into());
    }
    let value = response
        .result
        .ok_or("daemon returned neither a result nor an error")?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritext_rpc::RpcError;

    #[test]
    fn test_unwrap_success() {
        let resp = JsonRpcResponse::ok(serde_json::json!({"status": "ok"}));
        let value: serde_json::Value = unwrap_envelope(resp).unwrap();
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn test_unwrap_error_keeps_message() {
        let resp = JsonRpcResponse::err(RpcError::invalid_request("prompt is empty"));
        let err = unwrap_envelope::<serde_json::Value>(resp).unwrap_err();
        assert!(err.to_string().contains("prompt is empty"));
    }
}
