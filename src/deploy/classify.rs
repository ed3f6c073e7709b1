use crate::error::DeployError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FriendlyCategory {
    InsufficientFunds,
    InvalidCredential,
    NetworkUnavailable,
    GasTooLow,
    Reverted,
    NonceConflict,
    Rejected,
    ConfirmationTimeout,
    NotReady,
    UpstreamTool,
    Unknown,
}

impl FriendlyCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientFunds => "insufficient-funds",
            Self::InvalidCredential => "invalid-credential",
            Self::NetworkUnavailable => "network-unavailable",
            Self::GasTooLow => "gas-too-low",
            Self::Reverted => "reverted",
            Self::NonceConflict => "nonce-conflict",
            Self::Rejected => "rejected",
            Self::ConfirmationTimeout => "confirmation-timeout",
            Self::NotReady => "not-ready",
            Self::UpstreamTool => "upstream-tool",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FriendlyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyError {
    pub category: FriendlyCategory,
    pub message: String,
}

impl fmt::Display for FriendlyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// Match raw node text against the known failure shapes.
fn classify_message(message: &str) -> Option<FriendlyCategory> {
    let msg = message.to_ascii_lowercase();
    if msg.contains("insufficient funds") {
        Some(FriendlyCategory::InsufficientFunds)
    } else if msg.contains("private key") || msg.contains("signing key") {
        Some(FriendlyCategory::InvalidCredential)
    } else if msg.contains("nonce") {
        Some(FriendlyCategory::NonceConflict)
    } else if msg.contains("intrinsic gas") || msg.contains("out of gas") || msg.contains("gas too low")
    {
        Some(FriendlyCategory::GasTooLow)
    } else if msg.contains("revert") {
        Some(FriendlyCategory::Reverted)
    } else if msg.contains("rejected") || msg.contains("denied") {
        Some(FriendlyCategory::Rejected)
    } else if msg.contains("network") || msg.contains("timed out") || msg.contains("connection") {
        Some(FriendlyCategory::NetworkUnavailable)
    } else {
        None
    }
}

fn message_for(category: FriendlyCategory, detail: &str) -> String {
    match category {
        FriendlyCategory::InsufficientFunds => {
            "insufficient balance; fund the deployer account from a test-network faucet and retry"
                .to_string()
        }
        FriendlyCategory::InvalidCredential => {
            "invalid signing key; expected 0x followed by 64 hex characters".to_string()
        }
        FriendlyCategory::NetworkUnavailable => {
            format!("network unavailable; no RPC endpoint could serve the request ({detail})")
        }
        FriendlyCategory::GasTooLow => "gas limit too low; raise the gas limit and retry".to_string(),
        FriendlyCategory::Reverted => {
            "contract creation reverted; check the constructor logic".to_string()
        }
        FriendlyCategory::NonceConflict => {
            "nonce conflict; wait for pending transactions to confirm and retry".to_string()
        }
        FriendlyCategory::Rejected => "transaction rejected by the network".to_string(),
        FriendlyCategory::ConfirmationTimeout => {
            "transaction not confirmed in time; check it on the block explorer".to_string()
        }
        FriendlyCategory::NotReady => format!("deployment not allowed: {detail}"),
        // Raw upstream text stays on the typed error; stored messages are fixed strings.
        FriendlyCategory::UpstreamTool => {
            "an external tool failed; see the pipeline log for details".to_string()
        }
        FriendlyCategory::Unknown => {
            "deployment failed; see the pipeline log for details".to_string()
        }
    }
}

/// Map a deployment failure to a stable category and an actionable message.
pub fn classify(err: &DeployError) -> FriendlyError {
    let (category, detail) = match err {
        DeployError::Validation(msg) => (
            classify_message(msg)
                .filter(|c| *c == FriendlyCategory::InvalidCredential)
                .unwrap_or(FriendlyCategory::NotReady),
            msg.clone(),
        ),
        DeployError::Credential(msg) => (FriendlyCategory::InvalidCredential, msg.clone()),
        DeployError::InsufficientFunds { .. } => (FriendlyCategory::InsufficientFunds, String::new()),
        DeployError::Reverted { .. } => (FriendlyCategory::Reverted, String::new()),
        DeployError::ConfirmationTimeout { .. } => {
            (FriendlyCategory::ConfirmationTimeout, String::new())
        }
        DeployError::NetworkExhausted(inner) => {
            (FriendlyCategory::NetworkUnavailable, inner.to_string())
        }
        DeployError::UpstreamTool(msg) => (FriendlyCategory::UpstreamTool, msg.clone()),
        DeployError::Estimation(msg) | DeployError::Submission(msg) => (
            classify_message(msg).unwrap_or(FriendlyCategory::Unknown),
            msg.clone(),
        ),
    };
    FriendlyError {
        category,
        message: message_for(category, &detail),
    }
}
