use crate::error::ToolError;

pub const PINNED_PRAGMA: &str = "pragma solidity ^0.8.20;";
const DEFAULT_CONTRACT_NAME: &str = "Contract";

/// Normalize language-model output into compilable source.
///
/// Fence lines are dropped, a concrete `pragma solidity x.y.z;` is pinned to `^0.8.20` and the
/// `@security` NatSpec tag (rejected by solc) becomes plain text.
pub fn clean_source(raw: &str) -> String {
    let without_fences: Vec<&str> = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    let joined = without_fences.join("\n").replace("```", "");
    let pinned = pin_pragma(joined.trim());
    pinned.replace("@security", "Security Note:")
}

fn is_concrete_version(raw: &str) -> bool {
    let version = raw.trim().strip_prefix('^').unwrap_or(raw.trim());
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

fn pin_pragma(code: &str) -> String {
    const KEYWORD: &str = "pragma solidity";
    let Some(start) = code.find(KEYWORD) else {
        return code.to_string();
    };
    let after = start + KEYWORD.len();
    let Some(semi) = code[after..].find(';') else {
        return code.to_string();
    };
    let version = &code[after..after + semi];
    if !version.starts_with(char::is_whitespace) || !is_concrete_version(version) {
        return code.to_string();
    }
    format!("{}{}{}", &code[..start], PINNED_PRAGMA, &code[after + semi + 1..])
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// First `contract <Name>` declaration, if any.
pub fn extract_contract_name(code: &str) -> Option<String> {
    let bytes = code.as_bytes();
    let mut from = 0;
    while let Some(pos) = code[from..].find("contract") {
        let start = from + pos;
        let end = start + "contract".len();
        from = end;
        if start > 0 && is_ident_byte(bytes[start - 1]) {
            continue;
        }
        let rest = &code[end..];
        let trimmed = rest.trim_start();
        if trimmed.len() == rest.len() {
            continue;
        }
        let name: String = trimmed
            .bytes()
            .take_while(|b| is_ident_byte(*b))
            .map(char::from)
            .collect();
        if !name.is_empty() {
            return Some(name);
        }
    }
    None
}

pub fn contract_name_or_default(code: &str) -> String {
    extract_contract_name(code).unwrap_or_else(|| DEFAULT_CONTRACT_NAME.to_string())
}

/// Minimal shape check before spending a compiler or analyzer run.
pub fn validate_source(code: &str) -> Result<(), ToolError> {
    if code.trim().is_empty() {
        return Err(ToolError::InvalidSource("contract source is empty".to_string()));
    }
    if !code.contains("pragma solidity") {
        return Err(ToolError::InvalidSource(
            "contract source must declare `pragma solidity`".to_string(),
        ));
    }
    if extract_contract_name(code).is_none() {
        return Err(ToolError::InvalidSource(
            "contract source must define a contract".to_string(),
        ));
    }
    Ok(())
}
