use crate::error::DeployError;
use crate::tools::source::extract_contract_name;
use crate::utils::hex::clean_hex;
use crate::workflow::types::{has_deployable_bytecode, WorkflowState};
use alloy::primitives::Bytes;
use serde_json::{json, Value};

/// Init code of an empty contract, deployed only when placeholder artifacts are enabled.
pub const PLACEHOLDER_BYTECODE: &str = "0x6080604052348015600e57600080fd5b50600080f3fe6080604052600080fdfea2646970667358221220aafdc1f5e6c4c34b2b6d7c9a8c1e4d5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d64736f6c63430008180033";

pub fn placeholder_abi() -> Value {
    json!([
        {
            "inputs": [],
            "stateMutability": "nonpayable",
            "type": "constructor"
        },
        {
            "inputs": [],
            "name": "getVersion",
            "outputs": [{"internalType": "string", "name": "", "type": "string"}],
            "stateMutability": "pure",
            "type": "function"
        }
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    Compiled,
    Extracted,
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub contract_name: String,
    pub abi: Value,
    pub bytecode: Bytes,
    pub source: ArtifactSource,
}

fn decode_bytecode(raw: &str, origin: &str) -> Result<Bytes, DeployError> {
    hex::decode(clean_hex(raw))
        .map(Bytes::from)
        .map_err(|err| DeployError::Validation(format!("{origin} bytecode is not valid hex: {err}")))
}

/// Pick the init code to deploy: compiled artifact, then a JSON artifact pasted as source, then
/// the placeholder when enabled.
pub fn resolve(state: &WorkflowState, allow_placeholder: bool) -> Result<ResolvedArtifact, DeployError> {
    if let Some(artifact) = state.compile_artifact.as_ref().filter(|a| a.is_deployable()) {
        return Ok(ResolvedArtifact {
            contract_name: artifact.contract_name.clone(),
            abi: artifact.abi.clone(),
            bytecode: decode_bytecode(&artifact.bytecode, "compiled")?,
            source: ArtifactSource::Compiled,
        });
    }

    let code = state.deployable_code();
    if let Some(extracted) = extract_from_source(code) {
        return Ok(extracted);
    }

    if allow_placeholder {
        tracing::warn!("[DEPLOY] no compiled bytecode; deploying placeholder artifact");
        let contract_name = extract_contract_name(code).unwrap_or_else(|| "MockContract".to_string());
        return Ok(ResolvedArtifact {
            contract_name,
            abi: placeholder_abi(),
            bytecode: decode_bytecode(PLACEHOLDER_BYTECODE, "placeholder")?,
            source: ArtifactSource::Placeholder,
        });
    }

    Err(DeployError::Validation(
        "no deployable bytecode available; compile the contract first".to_string(),
    ))
}

/// Read a compiler artifact JSON (`bytecode`, `bytecode.object` or `evm.bytecode.object`).
pub fn extract_from_source(code: &str) -> Option<ResolvedArtifact> {
    let parsed: Value = serde_json::from_str(code.trim()).ok()?;
    let bytecode = parsed
        .get("bytecode")
        .and_then(|b| b.as_str().or_else(|| b.get("object").and_then(Value::as_str)))
        .or_else(|| parsed.pointer("/evm/bytecode/object").and_then(Value::as_str))?;
    if !has_deployable_bytecode(bytecode) {
        return None;
    }
    let bytecode = hex::decode(clean_hex(bytecode)).ok()?;
    let contract_name = parsed
        .get("contractName")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "SimpleContract".to_string());
    Some(ResolvedArtifact {
        contract_name,
        abi: parsed.get("abi").cloned().unwrap_or_else(|| json!([])),
        bytecode: Bytes::from(bytecode),
        source: ArtifactSource::Extracted,
    })
}
