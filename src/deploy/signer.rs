use crate::error::DeployError;
use crate::utils::error::compact_error_message;
use crate::utils::hex::clean_hex;
use crate::utils::secrets::SecretString;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;

/// Deployer private key, scoped to one deployment attempt.
pub struct SigningKey {
    secret: SecretString,
}

impl SigningKey {
    pub fn new(secret: impl Into<SecretString>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// `0x` followed by exactly 64 hex digits.
    pub fn is_well_formed(&self) -> bool {
        let raw = self.secret.expose().trim();
        raw.len() == 66
            && (raw.starts_with("0x") || raw.starts_with("0X"))
            && raw[2..].bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Derive the local signer. No network I/O.
    pub fn to_signer(&self) -> Result<PrivateKeySigner, DeployError> {
        PrivateKeySigner::from_str(clean_hex(self.secret.expose())).map_err(|err| {
            DeployError::Credential(compact_error_message(
                &format!("signing key does not map to a secp256k1 account: {err}"),
                160,
            ))
        })
    }

    pub fn clear(&mut self) {
        self.secret.clear();
    }

    pub fn is_cleared(&self) -> bool {
        self.secret.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

impl From<SecretString> for SigningKey {
    fn from(secret: SecretString) -> Self {
        Self { secret }
    }
}
