use crate::error::DeployError;
use crate::rpc::FailoverProxy;
use crate::utils::hex::quantity_to_u64;
use alloy::primitives::B256;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// The receipt fields the orchestrator reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
}

impl ReceiptView {
    /// Only an explicit `0x0` status means failure; pre-Byzantium receipts carry no status.
    pub fn reverted(&self) -> bool {
        self.status
            .as_deref()
            .and_then(quantity_to_u64)
            .is_some_and(|status| status == 0)
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(quantity_to_u64)
    }

    pub fn gas_used(&self) -> Option<u64> {
        self.gas_used.as_deref().and_then(quantity_to_u64)
    }
}

/// Poll `eth_getTransactionReceipt` until the transaction is included or `timeout` elapses.
///
/// Lookup errors are transient here: the transaction is already broadcast, so polling continues.
pub async fn wait_for_receipt(
    proxy: &FailoverProxy,
    network: &str,
    tx_hash: B256,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ReceiptView, DeployError> {
    let started = tokio::time::Instant::now();
    let deadline = started + timeout;
    let params = json!([format!("{tx_hash:#x}")]);

    loop {
        match proxy
            .call(network, "eth_getTransactionReceipt", params.clone())
            .await
        {
            Ok(Value::Null) => {}
            Ok(value) => {
                let receipt: ReceiptView = serde_json::from_value(value).map_err(|err| {
                    DeployError::Submission(format!("malformed transaction receipt: {err}"))
                })?;
                return Ok(receipt);
            }
            Err(err) => {
                tracing::warn!("[DEPLOY] receipt lookup for {tx_hash:#x} failed: {err}");
            }
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(DeployError::ConfirmationTimeout {
                tx_hash,
                waited_ms: now.duration_since(started).as_millis() as u64,
            });
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}
