use alloy::primitives::U256;

/// Clean a hex string by removing "0x" prefix and whitespace
pub fn clean_hex(s: &str) -> &str {
    let s = s.trim();
    if let Some(stripped) = s.strip_prefix("0x") {
        stripped
    } else if let Some(stripped) = s.strip_prefix("0X") {
        stripped
    } else {
        s
    }
}

/// Parse a JSON-RPC quantity (`0x`-prefixed hex) into U256.
pub fn quantity_to_u256(s: &str) -> Option<U256> {
    let digits = clean_hex(s);
    if digits.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).ok()
}

/// Parse a JSON-RPC quantity into u64; `None` on overflow or garbage.
pub fn quantity_to_u64(s: &str) -> Option<u64> {
    let digits = clean_hex(s);
    if digits.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(digits, 16).ok()
}

pub fn quantity_to_u128(s: &str) -> Option<u128> {
    let digits = clean_hex(s);
    if digits.is_empty() {
        return Some(0);
    }
    u128::from_str_radix(digits, 16).ok()
}
