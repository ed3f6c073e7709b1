mod support;

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::keccak256;
use contract_pilot::config::networks::Network;
use contract_pilot::deploy::{DeployRequest, DeploySettings, DeployStage, Deployer, SigningKey};
use contract_pilot::error::{DeployError, RpcError};
use contract_pilot::workflow::types::{CompileArtifact, DetectionReport, Finding, Severity};
use contract_pilot::workflow::WorkflowStore;
use serde_json::{json, Value};
use std::sync::Arc;
use support::{proxy, Scripted, ScriptedTransport, DEV_KEY, E1, E2};

const CODE: &str = "pragma solidity ^0.8.20;\ncontract Counter {\n    uint256 public count;\n}";
const INIT_CODE: &str = "0x6080604052348015600e575f80fd5b50603e80601a5f395ff3fe";
const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

fn ready_store() -> WorkflowStore {
    let store = WorkflowStore::new();
    store.set_generated_code(CODE);
    store.set_compile_artifact(CompileArtifact {
        success: true,
        abi: json!([]),
        bytecode: INIT_CODE.to_string(),
        deployed_bytecode: "0x6080".to_string(),
        contract_name: "Counter".to_string(),
    });
    store.set_detection_report(DetectionReport::new(
        vec![Finding {
            kind: "solc-version".into(),
            line: 1,
            severity: Severity::Informational,
            suggestion: "pin the compiler".into(),
            confidence: "High".into(),
        }],
        CODE,
    ));
    store
}

fn request() -> DeployRequest {
    DeployRequest::new(Network::Sepolia, SigningKey::new(DEV_KEY))
}

fn receipt(status: &str) -> Value {
    json!({
        "status": status,
        "contractAddress": CONTRACT,
        "blockNumber": "0x4b0",
        "gasUsed": "0x1d4c0"
    })
}

fn script_healthy_node(transport: &ScriptedTransport, url: &str) {
    transport
        .on(url, "eth_getBalance", Scripted::Ok(json!("0xde0b6b3a7640000")))
        .on(url, "eth_gasPrice", Scripted::Ok(json!("0x3b9aca00")))
        .on(url, "eth_getTransactionCount", Scripted::Ok(json!("0x7")))
        .on(url, "eth_estimateGas", Scripted::Ok(json!("0x186a0")))
        .on(url, "eth_sendRawTransaction", Scripted::Ok(json!("0x00")))
        .on(url, "eth_getTransactionReceipt", Scripted::Ok(Value::Null))
        .on(url, "eth_getTransactionReceipt", Scripted::Ok(receipt("0x1")));
}

fn sent_raw(transport: &ScriptedTransport) -> Vec<u8> {
    let call = transport
        .calls()
        .into_iter()
        .find(|c| c.method == "eth_sendRawTransaction")
        .expect("transaction submitted");
    let raw = call.params[0].as_str().expect("raw transaction hex");
    hex::decode(raw.trim_start_matches("0x")).expect("valid hex")
}

fn decode(raw: &[u8]) -> TxEnvelope {
    let mut buf = raw;
    TxEnvelope::decode_2718(&mut buf).expect("signed transaction decodes")
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_successful_deployment_records_receipt_and_margin() {
    let transport = ScriptedTransport::new();
    script_healthy_node(&transport, E1);
    let store = ready_store();
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        store.clone(),
        DeploySettings::default(),
    );

    let outcome = deployer.deploy(request()).await;

    assert!(outcome.error.is_none(), "unexpected error: {:?}", outcome.error);
    assert!(outcome.stored);
    assert!(outcome.result.success);
    assert_eq!(outcome.result.contract_address.as_deref(), Some(CONTRACT));
    assert_eq!(outcome.result.block_number, Some(1_200));
    assert_eq!(outcome.result.gas_used, Some(120_000));
    assert_eq!(deployer.stage(), DeployStage::Succeeded);

    let raw = sent_raw(&transport);
    let expected_hash = format!("{:#x}", keccak256(&raw));
    assert_eq!(outcome.result.tx_hash.as_deref(), Some(expected_hash.as_str()));

    let tx = decode(&raw);
    // ceil(100_000 * 1.5)
    assert_eq!(tx.gas_limit(), 150_000);
    assert_eq!(tx.nonce(), 7);
    assert_eq!(tx.chain_id(), Some(11_155_111));
    assert_eq!(tx.gas_price(), Some(1_000_000_000));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.deployment_result.as_ref(), Some(&outcome.result));
}

#[tokio::test(flavor = "current_thread")]
async fn test_zero_balance_fails_before_estimation() {
    let transport = ScriptedTransport::new();
    transport
        .on(E1, "eth_getBalance", Scripted::Ok(json!("0x0")))
        .on(E1, "eth_estimateGas", Scripted::Ok(json!("0x5208")));
    let store = ready_store();
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        store.clone(),
        DeploySettings::default(),
    );

    let outcome = deployer.deploy(request()).await;

    assert!(matches!(
        outcome.error,
        Some(DeployError::InsufficientFunds { .. })
    ));
    assert!(!outcome.result.success);
    assert!(outcome
        .result
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("insufficient-funds:")));
    assert!(outcome.result.tx_hash.is_none());
    assert_eq!(transport.methods(), vec!["eth_getBalance"]);
    assert_eq!(deployer.stage(), DeployStage::Failed);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_reverted_receipt_fails_with_tx_hash() {
    let transport = ScriptedTransport::new();
    transport
        .on(E1, "eth_getBalance", Scripted::Ok(json!("0xde0b6b3a7640000")))
        .on(E1, "eth_gasPrice", Scripted::Ok(json!("0x3b9aca00")))
        .on(E1, "eth_getTransactionCount", Scripted::Ok(json!("0x0")))
        .on(E1, "eth_estimateGas", Scripted::Ok(json!("0x5208")))
        .on(E1, "eth_sendRawTransaction", Scripted::Ok(json!("0x00")))
        .on(E1, "eth_getTransactionReceipt", Scripted::Ok(receipt("0x0")));
    let store = ready_store();
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        store.clone(),
        DeploySettings::default(),
    );

    let outcome = deployer.deploy(request()).await;

    assert!(matches!(outcome.error, Some(DeployError::Reverted { .. })));
    assert!(!outcome.result.success);
    let expected_hash = format!("{:#x}", keccak256(sent_raw(&transport)));
    assert_eq!(outcome.result.tx_hash.as_deref(), Some(expected_hash.as_str()));
    assert!(outcome
        .result
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("reverted:")));
    assert_eq!(
        store.snapshot().deployment_result.as_ref(),
        Some(&outcome.result)
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_failed_estimation_falls_back_to_default_gas_and_uses_price_hint() {
    let transport = ScriptedTransport::new();
    transport
        .on(E1, "eth_getBalance", Scripted::Ok(json!("0xde0b6b3a7640000")))
        .on(E1, "eth_getTransactionCount", Scripted::Ok(json!("0x1")))
        .on(
            E1,
            "eth_estimateGas",
            Scripted::Fail(RpcError::Node {
                code: 3,
                message: "execution reverted".into(),
            }),
        )
        .on(E1, "eth_sendRawTransaction", Scripted::Ok(json!("0x00")))
        .on(E1, "eth_getTransactionReceipt", Scripted::Ok(receipt("0x1")));
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        ready_store(),
        DeploySettings::default(),
    );
    let mut request = request();
    request.gas_price_gwei = Some("2.5".into());

    let outcome = deployer.deploy(request).await;

    assert!(outcome.result.success, "unexpected failure: {:?}", outcome.error);
    assert!(!transport.methods().iter().any(|m| m == "eth_gasPrice"));
    let tx = decode(&sent_raw(&transport));
    assert_eq!(tx.gas_limit(), 3_000_000);
    assert_eq!(tx.gas_price(), Some(2_500_000_000));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_submission_goes_through_endpoint_that_served_estimation() {
    let transport = ScriptedTransport::new();
    transport.on(
        E1,
        "eth_getBalance",
        Scripted::Fail(RpcError::Transport("connection reset".into())),
    );
    script_healthy_node(&transport, E2);
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1, E2]),
        ready_store(),
        DeploySettings::default(),
    );

    let outcome = deployer.deploy(request()).await;

    assert!(outcome.result.success, "unexpected failure: {:?}", outcome.error);
    assert_eq!(transport.urls_for("eth_sendRawTransaction"), vec![E2]);
}

#[tokio::test(flavor = "current_thread")]
async fn test_gated_code_is_rejected_without_network_io() {
    let transport = ScriptedTransport::new();
    script_healthy_node(&transport, E1);
    let store = ready_store();
    store.set_detection_report(DetectionReport::new(
        vec![Finding {
            kind: "reentrancy-eth".into(),
            line: 3,
            severity: Severity::High,
            suggestion: "apply checks-effects-interactions".into(),
            confidence: "Medium".into(),
        }],
        CODE,
    ));
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        store.clone(),
        DeploySettings::default(),
    );

    let outcome = deployer.deploy(request()).await;

    assert!(matches!(outcome.error, Some(DeployError::Validation(_))));
    assert_eq!(
        outcome.result.error.as_deref(),
        Some("not-ready: deployment not allowed: deployment blocked: 1 high-severity finding")
    );
    assert!(transport.calls().is_empty());
    assert_eq!(
        store.snapshot().deployment_result.as_ref(),
        Some(&outcome.result)
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_malformed_key_is_an_invalid_credential() {
    let transport = ScriptedTransport::new();
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        ready_store(),
        DeploySettings::default(),
    );

    let outcome = deployer
        .deploy(DeployRequest::new(Network::Sepolia, SigningKey::new("0x1234")))
        .await;

    assert!(outcome
        .result
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("invalid-credential:")));
    assert!(!outcome.result.error.as_deref().unwrap_or("").contains("0x1234"));
    assert!(transport.calls().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_mainnet_is_refused() {
    let transport = ScriptedTransport::new();
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        ready_store(),
        DeploySettings::default(),
    );

    let outcome = deployer
        .deploy(DeployRequest::new(Network::Mainnet, SigningKey::new(DEV_KEY)))
        .await;

    assert!(matches!(outcome.error, Some(DeployError::Validation(_))));
    assert!(transport.calls().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_result_for_replaced_code_is_dropped() {
    let transport = ScriptedTransport::new();
    script_healthy_node(&transport, E1);
    let store = ready_store();
    let deployer = Arc::new(Deployer::new(
        proxy(transport.clone(), &[E1]),
        store.clone(),
        DeploySettings::default(),
    ));
    let mut stages = deployer.stages();

    let edit = async {
        stages
            .wait_for(|stage| *stage == DeployStage::Confirming)
            .await
            .expect("stage channel open");
        store.set_generated_code("pragma solidity ^0.8.20;\ncontract Replaced {}");
    };
    let (outcome, ()) = tokio::join!(deployer.deploy(request()), edit);

    assert!(outcome.result.success);
    assert!(!outcome.stored);
    assert!(store.snapshot().deployment_result.is_none());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_unconfirmed_transaction_times_out_with_tx_hash() {
    let transport = ScriptedTransport::new();
    transport
        .on(E1, "eth_getBalance", Scripted::Ok(json!("0xde0b6b3a7640000")))
        .on(E1, "eth_gasPrice", Scripted::Ok(json!("0x3b9aca00")))
        .on(E1, "eth_getTransactionCount", Scripted::Ok(json!("0x2")))
        .on(E1, "eth_estimateGas", Scripted::Ok(json!("0x5208")))
        .on(E1, "eth_sendRawTransaction", Scripted::Ok(json!("0x00")))
        .on(E1, "eth_getTransactionReceipt", Scripted::Ok(Value::Null));
    let store = ready_store();
    let settings = DeploySettings {
        confirmation_timeout_ms: 10_000,
        confirmation_poll_ms: 1_000,
        ..DeploySettings::default()
    };
    let deployer = Deployer::new(proxy(transport.clone(), &[E1]), store.clone(), settings);
    let mut request = request();

    let outcome = deployer.deploy_with(&mut request).await;

    assert!(matches!(
        outcome.error,
        Some(DeployError::ConfirmationTimeout { waited_ms, .. }) if waited_ms >= 10_000
    ));
    assert!(!outcome.result.success);
    assert!(outcome
        .result
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("confirmation-timeout:")));
    let expected_hash = format!("{:#x}", keccak256(sent_raw(&transport)));
    assert_eq!(outcome.result.tx_hash.as_deref(), Some(expected_hash.as_str()));
    assert_eq!(transport.urls_for("eth_sendRawTransaction"), vec![E1]);
    assert!(transport.urls_for("eth_getTransactionReceipt").len() > 1);
    assert!(request.signing_key.is_cleared());
    assert_eq!(
        store.snapshot().deployment_result.as_ref(),
        Some(&outcome.result)
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_exhausted_endpoints_mid_attempt_report_network_unavailable() {
    let transport = ScriptedTransport::new();
    transport
        .on(E1, "eth_getBalance", Scripted::Ok(json!("0xde0b6b3a7640000")))
        .on(
            E1,
            "eth_gasPrice",
            Scripted::Fail(RpcError::Transport("connection refused".into())),
        )
        .on(
            E2,
            "eth_gasPrice",
            Scripted::Fail(RpcError::Rejected {
                status: 503,
                body: "upstream overloaded".into(),
            }),
        );
    let store = ready_store();
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1, E2]),
        store.clone(),
        DeploySettings::default(),
    );
    let mut request = request();

    let outcome = deployer.deploy_with(&mut request).await;

    match &outcome.error {
        Some(DeployError::NetworkExhausted(RpcError::Exhausted {
            network,
            last_error,
            ..
        })) => {
            assert_eq!(network, "sepolia");
            assert!(last_error.contains("upstream overloaded"));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    let stored = outcome.result.error.as_deref().expect("stored error");
    assert!(stored.starts_with("network-unavailable:"), "{stored}");
    assert!(stored.contains("upstream overloaded"), "{stored}");
    assert!(outcome.result.tx_hash.is_none());
    assert_eq!(transport.urls_for("eth_gasPrice"), vec![E1, E2]);
    assert!(!transport.methods().iter().any(|m| m == "eth_sendRawTransaction"));
    assert!(request.signing_key.is_cleared());
    assert_eq!(deployer.stage(), DeployStage::Failed);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_signing_key_is_wiped_after_success_and_refusal() {
    let transport = ScriptedTransport::new();
    script_healthy_node(&transport, E1);
    let deployer = Deployer::new(
        proxy(transport.clone(), &[E1]),
        ready_store(),
        DeploySettings::default(),
    );

    let mut accepted = request();
    assert!(!accepted.signing_key.is_cleared());
    let outcome = deployer.deploy_with(&mut accepted).await;
    assert!(outcome.result.success, "unexpected failure: {:?}", outcome.error);
    assert!(accepted.signing_key.is_cleared());
    assert!(!accepted.signing_key.is_well_formed());

    let mut refused = DeployRequest::new(Network::Mainnet, SigningKey::new(DEV_KEY));
    let outcome = deployer.deploy_with(&mut refused).await;
    assert!(matches!(outcome.error, Some(DeployError::Validation(_))));
    assert!(refused.signing_key.is_cleared());
    assert!(!format!("{refused:?}").contains(&DEV_KEY[2..]));
}
