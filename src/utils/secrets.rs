//! Injected secret sourcing.
//!
//! API keys and signing keys never live in source or config structs as plain `String`s: they are
//! fetched through a `SecretSource` and held in `SecretString`, which redacts itself in `Debug`
//! output and zeroizes its buffer when cleared or dropped.

use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

#[derive(Clone)]
pub struct SecretString {
    value: Zeroizing<String>,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
        }
    }

    /// Borrow the secret. Callers must not format the returned value into logs.
    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn clear(&mut self) {
        self.value.zeroize();
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("SecretString(<empty>)")
        } else {
            f.write_str("SecretString(<redacted>)")
        }
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Provider of named secrets (API keys, signing keys).
pub trait SecretSource: Send + Sync {
    fn secret(&self, name: &str) -> Option<SecretString>;
}

/// Reads secrets from process environment variables; empty values count as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn secret(&self, name: &str) -> Option<SecretString> {
        let raw = Zeroizing::new(std::env::var(name).ok()?);
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| SecretString::new(trimmed))
    }
}

/// Fixed in-memory secrets, for embedding callers and tests.
#[derive(Default)]
pub struct StaticSecrets {
    values: HashMap<String, SecretString>,
}

impl StaticSecrets {
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SecretString>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretSource for StaticSecrets {
    fn secret(&self, name: &str) -> Option<SecretString> {
        self.values.get(name).filter(|v| !v.is_empty()).cloned()
    }
}
