use alloy::primitives::{B256, U256};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("deployment error: {0}")]
    Deploy(#[from] DeployError),
    #[error("network error: {0}")]
    Net(#[from] RpcError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("upstream tool error: {0}")]
    Tool(#[from] ToolError),
}

/// Failures of a single JSON-RPC call, before the orchestrator gives them meaning.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("endpoint rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("request timed out after {0}ms")]
    Timeout(u64),
    #[error("malformed JSON-RPC response: {0}")]
    Malformed(String),
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },
    #[error("all endpoints for network `{network}` failed for `{method}`; last error: {last_error}")]
    Exhausted {
        network: String,
        method: String,
        last_error: String,
    },
}

impl RpcError {
    /// Whether the next endpoint in the list should be tried after this error.
    pub fn is_endpoint_fault(&self) -> bool {
        match self {
            Self::InvalidUrl { .. }
            | Self::Transport(_)
            | Self::Rejected { .. }
            | Self::Timeout(_)
            | Self::Malformed(_) => true,
            Self::Node { code, message } => !is_deterministic_node_error(*code, message),
            Self::Exhausted { .. } => false,
        }
    }
}

/// Node errors every healthy node would repeat verbatim; failing over cannot help.
pub fn is_deterministic_node_error(code: i64, message: &str) -> bool {
    if matches!(code, -32601 | -32602 | -32700) {
        return true;
    }
    let msg = message.to_ascii_lowercase();
    [
        "method not found",
        "invalid params",
        "execution reverted",
        "revert",
        "parse error",
        "insufficient funds",
        "nonce too low",
        "already known",
        "intrinsic gas too low",
    ]
    .iter()
    .any(|needle| msg.contains(needle))
}

/// Deployment taxonomy surfaced by the orchestrator.
#[derive(Debug, Clone, Error)]
pub enum DeployError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("signing credential rejected: {0}")]
    Credential(String),
    #[error("insufficient funds: balance {balance} wei is below the required {required} wei")]
    InsufficientFunds { balance: U256, required: U256 },
    #[error("gas estimation failed: {0}")]
    Estimation(String),
    #[error("transaction submission failed: {0}")]
    Submission(String),
    #[error("transaction {tx_hash:#x} reverted during deployment")]
    Reverted { tx_hash: B256 },
    #[error("transaction {tx_hash:#x} not confirmed after {waited_ms}ms")]
    ConfirmationTimeout { tx_hash: B256, waited_ms: u64 },
    #[error("{0}")]
    NetworkExhausted(RpcError),
    #[error("upstream tool failure: {0}")]
    UpstreamTool(String),
}

impl DeployError {
    /// Lift a proxy failure into the deployment taxonomy.
    pub fn from_rpc(err: RpcError) -> Self {
        match err {
            RpcError::Exhausted { .. } => Self::NetworkExhausted(err),
            other => Self::Submission(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures of the compiler, analyzer or language-model collaborators.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("compilation failed: {0}")]
    Compile(String),
    #[error("static analysis failed: {0}")]
    Analysis(String),
    #[error("language model request failed: {0}")]
    Model(String),
    #[error("invalid contract source: {0}")]
    InvalidSource(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}
