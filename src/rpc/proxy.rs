use crate::config::networks::{EndpointRegistry, NetworkConfig};
use crate::error::RpcError;
use crate::rpc::transport::{endpoint_label, HttpTransport, RpcTransport};
use crate::rpc::types::{JsonRpcRequest, JsonRpcResponse, EXHAUSTED_ERROR_CODE};
use crate::utils::error::compact_error_message;
use crate::utils::hex::quantity_to_u64;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 15_000;
pub const HEALTH_CHECK_TIMEOUT_MS: u64 = 10_000;
const RPC_ERR_MAX_LEN: usize = 260;

/// Ordered-failover JSON-RPC client over a static per-network endpoint table.
///
/// Endpoints are tried strictly one after another, first entry first. Each attempt is bounded by
/// the per-call timeout, so a full sweep costs at most `endpoints * timeout`.
#[derive(Clone)]
pub struct FailoverProxy {
    registry: EndpointRegistry,
    transport: Arc<dyn RpcTransport>,
    call_timeout: Duration,
    next_id: Arc<AtomicU64>,
}

/// A single endpoint pinned by a successful routed call. Calls through it never fail over.
#[derive(Clone)]
pub struct EndpointHandle {
    network: String,
    url: String,
    transport: Arc<dyn RpcTransport>,
    call_timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for EndpointHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointHandle")
            .field("network", &self.network)
            .field("endpoint", &endpoint_label(&self.url))
            .finish()
    }
}

impl EndpointHandle {
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = JsonRpcRequest::new(
            self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        );
        call_endpoint(self.transport.as_ref(), &self.url, &request, self.call_timeout).await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointHealth {
    pub network: String,
    pub endpoint: String,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn call_endpoint(
    transport: &dyn RpcTransport,
    url: &str,
    request: &JsonRpcRequest,
    call_timeout: Duration,
) -> Result<Value, RpcError> {
    match tokio::time::timeout(call_timeout, transport.send(url, request)).await {
        Ok(result) => result,
        Err(_) => Err(RpcError::Timeout(call_timeout.as_millis() as u64)),
    }
}

impl FailoverProxy {
    pub fn new(
        registry: EndpointRegistry,
        transport: Arc<dyn RpcTransport>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            call_timeout,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn http(registry: EndpointRegistry, call_timeout: Duration) -> Self {
        Self::new(registry, Arc::new(HttpTransport::new()), call_timeout)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn network(&self, name: &str) -> &NetworkConfig {
        self.registry.resolve(name)
    }

    fn next_request(&self, method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params)
    }

    pub async fn call(&self, network: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        self.call_routed(network, method, params)
            .await
            .map(|(value, _)| value)
    }

    /// Like `call`, also returning the endpoint that answered so follow-up calls can pin to it.
    pub async fn call_routed(
        &self,
        network: &str,
        method: &str,
        params: Value,
    ) -> Result<(Value, EndpointHandle), RpcError> {
        let config = self.registry.resolve(network);
        let mut last_error: Option<String> = None;

        for (idx, url) in config.endpoints.iter().enumerate() {
            let request = self.next_request(method, params.clone());
            match call_endpoint(self.transport.as_ref(), url, &request, self.call_timeout).await {
                Ok(value) => {
                    if idx > 0 {
                        tracing::info!(
                            "[RPC] {} on {} served by fallback #{} ({})",
                            method,
                            config.network,
                            idx,
                            endpoint_label(url)
                        );
                    }
                    let handle = EndpointHandle {
                        network: config.network.as_str().to_string(),
                        url: url.clone(),
                        transport: self.transport.clone(),
                        call_timeout: self.call_timeout,
                        next_id: self.next_id.clone(),
                    };
                    return Ok((value, handle));
                }
                Err(err) if !err.is_endpoint_fault() => {
                    tracing::debug!(
                        "[RPC] {} on {} returned deterministic error: {}",
                        method,
                        config.network,
                        err
                    );
                    return Err(err);
                }
                Err(err) => {
                    let message = compact_error_message(&err.to_string(), RPC_ERR_MAX_LEN);
                    tracing::warn!(
                        "[RPC] {} on {} failed at {}: {}",
                        method,
                        config.network,
                        endpoint_label(url),
                        message
                    );
                    last_error = Some(message);
                }
            }
        }

        let err = RpcError::Exhausted {
            network: config.network.as_str().to_string(),
            method: method.to_string(),
            last_error: last_error.unwrap_or_else(|| "no endpoints configured".to_string()),
        };
        tracing::error!("[RPC] {}", err);
        Err(err)
    }

    /// Serve a client JSON-RPC request; the client's `id` is echoed back verbatim.
    pub async fn forward(&self, network: &str, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        match self.call(network, &method, params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(RpcError::Node { code, message }) => JsonRpcResponse::failure(id, code, message),
            Err(err) => JsonRpcResponse::failure(id, EXHAUSTED_ERROR_CODE, err.to_string()),
        }
    }

    /// Probe every configured endpoint with `eth_blockNumber`, one at a time.
    pub async fn health_check(&self) -> Vec<EndpointHealth> {
        let probe_timeout = Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS);
        let mut report = Vec::new();
        for config in self.registry.iter() {
            for url in &config.endpoints {
                let request = self.next_request("eth_blockNumber", json!([]));
                let started = Instant::now();
                let outcome =
                    call_endpoint(self.transport.as_ref(), url, &request, probe_timeout).await;
                let latency_ms = started.elapsed().as_millis() as u64;
                let entry = match outcome {
                    Ok(value) => {
                        let block_number = value.as_str().and_then(quantity_to_u64);
                        EndpointHealth {
                            network: config.network.as_str().to_string(),
                            endpoint: endpoint_label(url),
                            healthy: block_number.is_some(),
                            latency_ms,
                            block_number,
                            error: block_number
                                .is_none()
                                .then(|| format!("unexpected eth_blockNumber result: {value}")),
                        }
                    }
                    Err(err) => EndpointHealth {
                        network: config.network.as_str().to_string(),
                        endpoint: endpoint_label(url),
                        healthy: false,
                        latency_ms,
                        block_number: None,
                        error: Some(compact_error_message(&err.to_string(), RPC_ERR_MAX_LEN)),
                    },
                };
                report.push(entry);
            }
        }
        report
    }
}
