use crate::error::RpcError;
use crate::rpc::types::JsonRpcRequest;
use crate::utils::error::compact_error_message;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const TRANSPORT_BACKSTOP_TIMEOUT_MS: u64 = 65_000;
const BODY_SNIPPET_MAX_LEN: usize = 160;

/// One JSON-RPC exchange with one endpoint. Timeouts and failover belong to the caller.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send(&self, url: &str, request: &JsonRpcRequest) -> Result<Value, RpcError>;
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = match Client::builder()
            .timeout(Duration::from_millis(TRANSPORT_BACKSTOP_TIMEOUT_MS))
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    "[RPC] failed to construct timeout HTTP client: {err}. Falling back to default client."
                );
                Client::new()
            }
        };
        Self { client }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, url: &str, request: &JsonRpcRequest) -> Result<Value, RpcError> {
        let parsed = url.parse::<reqwest::Url>().map_err(|err| RpcError::InvalidUrl {
            url: endpoint_label(url),
            reason: err.to_string(),
        })?;
        let resp = self
            .client
            .post(parsed)
            .json(request)
            .send()
            .await
            .map_err(|err| RpcError::Transport(compact_error_message(&err.to_string(), 260)))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| RpcError::Transport(compact_error_message(&err.to_string(), 260)))?;
        decode_response(status.as_u16(), &body)
    }
}

/// Classify a raw HTTP reply into the call result or an `RpcError`.
pub fn decode_response(status: u16, body: &str) -> Result<Value, RpcError> {
    if !(200..300).contains(&status) {
        return Err(RpcError::Rejected {
            status,
            body: compact_error_message(body, BODY_SNIPPET_MAX_LEN),
        });
    }
    let parsed: Value = serde_json::from_str(body).map_err(|err| {
        RpcError::Malformed(format!(
            "{err}: {}",
            compact_error_message(body, BODY_SNIPPET_MAX_LEN)
        ))
    })?;
    if let Some(err) = parsed.get("error").filter(|v| !v.is_null()) {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown JSON-RPC error");
        return Err(RpcError::Node {
            code,
            message: compact_error_message(message, 260),
        });
    }
    match parsed.get("result") {
        Some(result) => Ok(result.clone()),
        None => Err(RpcError::Malformed(format!(
            "body without `result`/`error`: {}",
            compact_error_message(body, BODY_SNIPPET_MAX_LEN)
        ))),
    }
}

/// Scheme and host of an endpoint, for logs. Paths often embed provider API keys.
pub fn endpoint_label(url: &str) -> String {
    match url.parse::<reqwest::Url>() {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}://{}", parsed.scheme(), host),
            None => "<invalid-endpoint>".to_string(),
        },
        Err(_) => "<invalid-endpoint>".to_string(),
    }
}
