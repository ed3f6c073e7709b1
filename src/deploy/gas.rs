use crate::error::ConfigError;
use alloy::primitives::utils::parse_units;

pub const DEFAULT_GAS_LIMIT: u64 = 3_000_000;

/// Gas parameters chosen for the deployment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPlan {
    pub gas_limit: u64,
    pub gas_price_wei: u128,
    pub estimated: Option<u64>,
}

impl GasPlan {
    pub fn used_fallback(&self) -> bool {
        self.estimated.is_none()
    }
}

/// `ceil(estimated * 1.5)`, saturating.
pub fn with_safety_margin(estimated: u64) -> u64 {
    let scaled = (estimated as u128) * 3;
    let limit = scaled.div_ceil(2);
    u64::try_from(limit).unwrap_or(u64::MAX)
}

/// Gas limit to use: margin over a successful estimate, otherwise the configured default as-is.
pub fn choose_gas_limit(estimated: Option<u64>, default_limit: u64) -> u64 {
    match estimated {
        Some(estimated) => with_safety_margin(estimated),
        None => default_limit,
    }
}

/// Parse a decimal gwei amount (e.g. `30` or `1.5`) into wei.
pub fn gwei_to_wei(raw: &str) -> Result<u128, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(ConfigError::Invalid(format!(
            "gas price `{trimmed}` gwei must be positive"
        )));
    }
    let parsed = parse_units(trimmed, "gwei")
        .map_err(|err| ConfigError::Invalid(format!("gas price `{trimmed}` gwei: {err}")))?;
    let wei = parsed.get_absolute();
    if wei.is_zero() {
        return Err(ConfigError::Invalid(format!(
            "gas price `{trimmed}` gwei must be positive"
        )));
    }
    u128::try_from(wei)
        .map_err(|_| ConfigError::Invalid(format!("gas price `{trimmed}` gwei overflows u128")))
}
