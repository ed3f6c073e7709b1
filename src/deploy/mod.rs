//! Deployment orchestrator.
//!
//! One attempt walks `Validating → Connecting → Estimating → Deploying → Confirming` and ends in
//! `Succeeded` or `Failed`. Validation and credential failures never touch the network. Reads go
//! through the failover proxy; the signed transaction is submitted exactly once, through the
//! endpoint that answered the last estimation query.

pub mod artifact;
pub mod classify;
pub mod gas;
pub mod receipt;
pub mod signer;

use crate::config::networks::Network;
use crate::error::{DeployError, RpcError};
use crate::rpc::{EndpointHandle, FailoverProxy};
use crate::utils::error::compact_error_message;
use crate::utils::hex::{quantity_to_u128, quantity_to_u256, quantity_to_u64};
use crate::workflow::gate::blocked_reason;
use crate::workflow::types::{DeployResult, SeveritySummary, WorkflowState};
use crate::workflow::WorkflowStore;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::rpc::types::eth::TransactionRequest;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::watch;

pub use classify::{classify, FriendlyCategory, FriendlyError};
pub use gas::GasPlan;
pub use signer::SigningKey;

#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub default_gas_limit: u64,
    /// Decimal gwei; `None` asks the node via `eth_gasPrice`.
    pub gas_price_gwei: Option<String>,
    pub min_balance_wei: U256,
    pub confirmation_timeout_ms: u64,
    pub confirmation_poll_ms: u64,
    pub allow_placeholder_artifact: bool,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            default_gas_limit: gas::DEFAULT_GAS_LIMIT,
            gas_price_gwei: None,
            // 0.001 native units.
            min_balance_wei: U256::from(1_000_000_000_000_000u64),
            confirmation_timeout_ms: 180_000,
            confirmation_poll_ms: 2_000,
            allow_placeholder_artifact: false,
        }
    }
}

/// Parameters of a single attempt. The key is wiped when the attempt ends.
#[derive(Debug)]
pub struct DeployRequest {
    pub network: Network,
    pub signing_key: SigningKey,
    pub gas_limit: Option<u64>,
    pub gas_price_gwei: Option<String>,
}

impl DeployRequest {
    pub fn new(network: Network, signing_key: SigningKey) -> Self {
        Self {
            network,
            signing_key,
            gas_limit: None,
            gas_price_gwei: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    Idle,
    Validating,
    Connecting,
    Estimating,
    Deploying,
    Confirming,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub result: DeployResult,
    pub error: Option<DeployError>,
    /// False when the workflow code changed mid-attempt and the result was discarded.
    pub stored: bool,
}

struct Prepared {
    from: Address,
    nonce: u64,
    plan: GasPlan,
    handle: EndpointHandle,
}

pub struct Deployer {
    proxy: FailoverProxy,
    store: WorkflowStore,
    settings: DeploySettings,
    stage: watch::Sender<DeployStage>,
}

fn malformed(method: &str, value: &Value) -> DeployError {
    DeployError::from_rpc(RpcError::Malformed(format!(
        "{method} returned unexpected result {}",
        compact_error_message(&value.to_string(), 80)
    )))
}

impl Deployer {
    pub fn new(proxy: FailoverProxy, store: WorkflowStore, settings: DeploySettings) -> Self {
        let (stage, _rx) = watch::channel(DeployStage::Idle);
        Self {
            proxy,
            store,
            settings,
            stage,
        }
    }

    pub fn stages(&self) -> watch::Receiver<DeployStage> {
        self.stage.subscribe()
    }

    pub fn stage(&self) -> DeployStage {
        *self.stage.borrow()
    }

    fn advance(&self, stage: DeployStage) {
        self.stage.send_replace(stage);
        tracing::debug!("[DEPLOY] stage -> {:?}", stage);
    }

    /// Run one attempt against the current workflow snapshot and record its result.
    pub async fn deploy(&self, mut request: DeployRequest) -> DeployOutcome {
        self.deploy_with(&mut request).await
    }

    /// Same as [`Deployer::deploy`], leaving the caller's request behind with its key wiped.
    pub async fn deploy_with(&self, request: &mut DeployRequest) -> DeployOutcome {
        let snapshot = self.store.snapshot();
        let revision = snapshot.code_revision;
        let mut tx_hash: Option<B256> = None;

        let attempt = self.attempt(&snapshot, request, &mut tx_hash).await;
        request.signing_key.clear();

        let (result, error) = match attempt {
            Ok(result) => {
                self.advance(DeployStage::Succeeded);
                tracing::info!(
                    "[DEPLOY] contract deployed on {} at {} (tx {})",
                    request.network,
                    result.contract_address.as_deref().unwrap_or("<unknown>"),
                    result.tx_hash.as_deref().unwrap_or("<unknown>")
                );
                (result, None)
            }
            Err(err) => {
                self.advance(DeployStage::Failed);
                let friendly = classify(&err);
                tracing::warn!("[DEPLOY] attempt failed [{}]: {}", friendly.category, err);
                let result =
                    DeployResult::failed(friendly.to_string(), tx_hash.map(|h| format!("{h:#x}")));
                (result, Some(err))
            }
        };

        let stored = self.store.set_deployment_result_for(revision, result.clone());
        DeployOutcome {
            result,
            error,
            stored,
        }
    }

    async fn attempt(
        &self,
        snapshot: &WorkflowState,
        request: &DeployRequest,
        tx_hash: &mut Option<B256>,
    ) -> Result<DeployResult, DeployError> {
        self.advance(DeployStage::Validating);
        let gas_price_hint = validate(snapshot, request, &self.settings)?;

        self.advance(DeployStage::Connecting);
        let signer = request.signing_key.to_signer()?;
        let from = signer.address();

        self.advance(DeployStage::Estimating);
        let artifact = artifact::resolve(snapshot, self.settings.allow_placeholder_artifact)?;
        tracing::info!(
            "[DEPLOY] deploying {} ({} bytes, {:?}) to {}",
            artifact.contract_name,
            artifact.bytecode.len(),
            artifact.source,
            request.network
        );
        let prepared = self
            .estimate(request, from, &artifact.bytecode, gas_price_hint)
            .await?;

        self.advance(DeployStage::Deploying);
        let chain_id = self.proxy.network(request.network.as_str()).chain_id;
        let wallet = EthereumWallet::from(signer);
        let mut tx = TransactionRequest::default()
            .with_deploy_code(artifact.bytecode.clone())
            .with_chain_id(chain_id)
            .with_nonce(prepared.nonce)
            .with_gas_limit(prepared.plan.gas_limit)
            .with_gas_price(prepared.plan.gas_price_wei);
        tx.from = Some(prepared.from);
        let signed = tx
            .build(&wallet)
            .await
            .map_err(|err| DeployError::Submission(format!("transaction signing failed: {err}")))?;
        drop(wallet);
        let raw = signed.encoded_2718();
        let hash = keccak256(&raw);
        *tx_hash = Some(hash);

        tracing::info!(
            "[DEPLOY] submitting {:#x} via {:?} (gas_limit={} gas_price={}wei nonce={})",
            hash,
            prepared.handle,
            prepared.plan.gas_limit,
            prepared.plan.gas_price_wei,
            prepared.nonce
        );
        let submitted = prepared
            .handle
            .call(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(&raw))]),
            )
            .await
            .map_err(DeployError::from_rpc)?;
        if let Some(reported) = submitted.as_str() {
            if !reported.eq_ignore_ascii_case(&format!("{hash:#x}")) {
                tracing::warn!(
                    "[DEPLOY] node reported tx hash {} differing from local {:#x}",
                    reported,
                    hash
                );
            }
        }

        self.advance(DeployStage::Confirming);
        let receipt = receipt::wait_for_receipt(
            &self.proxy,
            request.network.as_str(),
            hash,
            Duration::from_millis(self.settings.confirmation_timeout_ms),
            Duration::from_millis(self.settings.confirmation_poll_ms.max(1)),
        )
        .await?;
        if receipt.reverted() {
            return Err(DeployError::Reverted { tx_hash: hash });
        }

        Ok(DeployResult {
            success: true,
            contract_address: receipt.contract_address.clone(),
            tx_hash: Some(format!("{hash:#x}")),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            error: None,
        })
    }

    async fn estimate(
        &self,
        request: &DeployRequest,
        from: Address,
        init_code: &[u8],
        gas_price_hint: Option<u128>,
    ) -> Result<Prepared, DeployError> {
        let network = request.network.as_str();
        let from_hex = format!("{from:#x}");

        let (raw_balance, mut handle) = self
            .proxy
            .call_routed(network, "eth_getBalance", json!([from_hex, "latest"]))
            .await
            .map_err(DeployError::from_rpc)?;
        let balance = raw_balance
            .as_str()
            .and_then(quantity_to_u256)
            .ok_or_else(|| malformed("eth_getBalance", &raw_balance))?;
        if balance.is_zero() || balance < self.settings.min_balance_wei {
            return Err(DeployError::InsufficientFunds {
                balance,
                required: self.settings.min_balance_wei,
            });
        }

        let gas_price_wei = match gas_price_hint {
            Some(price) => price,
            None => {
                let (raw, served_by) = self
                    .proxy
                    .call_routed(network, "eth_gasPrice", json!([]))
                    .await
                    .map_err(DeployError::from_rpc)?;
                handle = served_by;
                raw.as_str()
                    .and_then(quantity_to_u128)
                    .ok_or_else(|| malformed("eth_gasPrice", &raw))?
            }
        };

        let (raw_nonce, served_by) = self
            .proxy
            .call_routed(
                network,
                "eth_getTransactionCount",
                json!([from_hex, "pending"]),
            )
            .await
            .map_err(DeployError::from_rpc)?;
        handle = served_by;
        let nonce = raw_nonce
            .as_str()
            .and_then(quantity_to_u64)
            .ok_or_else(|| malformed("eth_getTransactionCount", &raw_nonce))?;

        let estimated = match self
            .proxy
            .call_routed(
                network,
                "eth_estimateGas",
                json!([{ "from": from_hex, "data": format!("0x{}", hex::encode(init_code)) }]),
            )
            .await
        {
            Ok((raw, served_by)) => match raw.as_str().and_then(quantity_to_u64) {
                Some(estimate) => {
                    handle = served_by;
                    Some(estimate)
                }
                None => {
                    tracing::warn!("[DEPLOY] {}; using default gas limit", malformed("eth_estimateGas", &raw));
                    None
                }
            },
            Err(err) => {
                let absorbed = DeployError::Estimation(compact_error_message(&err.to_string(), 260));
                tracing::warn!("[DEPLOY] {}; using default gas limit", absorbed);
                None
            }
        };

        let default_limit = request.gas_limit.unwrap_or(self.settings.default_gas_limit);
        let plan = GasPlan {
            gas_limit: gas::choose_gas_limit(estimated, default_limit),
            gas_price_wei,
            estimated,
        };
        tracing::info!(
            "[DEPLOY] gas plan: estimated={:?} limit={} fallback={}",
            plan.estimated,
            plan.gas_limit,
            plan.used_fallback()
        );

        Ok(Prepared {
            from,
            nonce,
            plan,
            handle,
        })
    }
}

/// Preconditions checked before any key use or network I/O. Returns the parsed gas price hint.
fn validate(
    snapshot: &WorkflowState,
    request: &DeployRequest,
    settings: &DeploySettings,
) -> Result<Option<u128>, DeployError> {
    if !snapshot.is_ready_for_deployment {
        let reason = snapshot
            .governing_report()
            .and_then(|report| blocked_reason(&SeveritySummary::from_findings(&report.findings)))
            .unwrap_or_else(|| "workflow is not ready for deployment".to_string());
        return Err(DeployError::Validation(reason));
    }
    let report = snapshot.governing_report().ok_or_else(|| {
        DeployError::Validation("no detection report covers the current code".to_string())
    })?;
    if !report.covers(snapshot.deployable_code()) {
        return Err(DeployError::Validation(
            "detection report was computed for different code; re-run analysis".to_string(),
        ));
    }
    if !request.network.is_testnet() {
        return Err(DeployError::Validation(format!(
            "network `{}` is not a test network",
            request.network
        )));
    }
    if !request.signing_key.is_well_formed() {
        return Err(DeployError::Validation(
            "signing key must be 0x followed by 64 hex characters".to_string(),
        ));
    }
    let hint = request
        .gas_price_gwei
        .as_deref()
        .or(settings.gas_price_gwei.as_deref());
    match hint {
        Some(raw) => gas::gwei_to_wei(raw)
            .map(Some)
            .map_err(|err| DeployError::Validation(err.to_string())),
        None => Ok(None),
    }
}
