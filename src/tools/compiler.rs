use crate::error::ToolError;
use crate::tools::source::contract_name_or_default;
use crate::tools::Compiler;
use crate::utils::error::compact_error_message;
use crate::workflow::types::{has_deployable_bytecode, CompileArtifact};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const SOURCE_UNIT: &str = "Contract.sol";
const OPTIMIZER_RUNS: u64 = 200;

/// `solc --standard-json` subprocess adapter.
pub struct SolcCompiler {
    bin: String,
    timeout: Duration,
}

impl SolcCompiler {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }
}

pub fn standard_json_input(source: &str) -> Value {
    json!({
        "language": "Solidity",
        "sources": { "Contract.sol": { "content": source } },
        "settings": {
            "optimizer": { "enabled": true, "runs": OPTIMIZER_RUNS },
            "outputSelection": {
                "*": { "*": ["abi", "evm.bytecode.object", "evm.deployedBytecode.object"] }
            }
        }
    })
}

fn with_prefix(hex_body: &str) -> String {
    if hex_body.is_empty() || hex_body.starts_with("0x") {
        hex_body.to_string()
    } else {
        format!("0x{hex_body}")
    }
}

/// Turn solc standard-JSON output into an artifact for `contract_name` (or the first contract
/// with init code).
pub fn parse_standard_json_output(
    output: &Value,
    contract_name: &str,
) -> Result<CompileArtifact, ToolError> {
    let errors: Vec<String> = output
        .get("errors")
        .and_then(Value::as_array)
        .map(|errs| {
            errs.iter()
                .filter(|e| e.get("severity").and_then(Value::as_str) == Some("error"))
                .map(|e| {
                    e.get("formattedMessage")
                        .or_else(|| e.get("message"))
                        .and_then(Value::as_str)
                        .unwrap_or("unknown compiler error")
                        .trim()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default();
    if !errors.is_empty() {
        return Err(ToolError::Compile(errors.join("\n")));
    }

    let contracts = output
        .pointer(&format!("/contracts/{SOURCE_UNIT}"))
        .and_then(Value::as_object)
        .ok_or_else(|| ToolError::Compile("compiler produced no contracts".to_string()))?;

    let bytecode_of = |c: &Value| {
        c.pointer("/evm/bytecode/object")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    let (name, contract) = match contracts.get(contract_name) {
        Some(contract) => (contract_name.to_string(), contract),
        None => contracts
            .iter()
            .find(|(_, c)| !bytecode_of(c).is_empty())
            .map(|(name, c)| (name.clone(), c))
            .ok_or_else(|| ToolError::Compile("no contract with bytecode in output".to_string()))?,
    };

    let bytecode = with_prefix(&bytecode_of(contract));
    if !has_deployable_bytecode(&bytecode) {
        return Err(ToolError::Compile(format!(
            "contract `{name}` compiled to empty bytecode"
        )));
    }
    let deployed_bytecode = with_prefix(
        contract
            .pointer("/evm/deployedBytecode/object")
            .and_then(Value::as_str)
            .unwrap_or(""),
    );

    Ok(CompileArtifact {
        success: true,
        abi: contract.get("abi").cloned().unwrap_or_else(|| json!([])),
        bytecode,
        deployed_bytecode,
        contract_name: name,
    })
}

#[async_trait]
impl Compiler for SolcCompiler {
    async fn compile(
        &self,
        source: &str,
        contract_name: Option<&str>,
    ) -> Result<CompileArtifact, ToolError> {
        let name = contract_name
            .map(str::to_string)
            .unwrap_or_else(|| contract_name_or_default(source));
        let input = serde_json::to_vec(&standard_json_input(source))
            .map_err(|err| ToolError::Compile(format!("failed to encode compiler input: {err}")))?;

        let mut child = Command::new(&self.bin)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&input).await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                ToolError::Compile(format!("solc timed out after {}ms", self.timeout.as_millis()))
            })??;
        let parsed: Value = serde_json::from_slice(&output.stdout).map_err(|err| {
            ToolError::Compile(format!(
                "unreadable solc output ({err}): {}",
                compact_error_message(&String::from_utf8_lossy(&output.stderr), 200)
            ))
        })?;

        let artifact = parse_standard_json_output(&parsed, &name)?;
        tracing::info!(
            "[TOOLS] compiled {} ({} bytes init code)",
            artifact.contract_name,
            artifact.bytecode.len().saturating_sub(2) / 2
        );
        Ok(artifact)
    }
}
