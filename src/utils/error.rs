/// Collapse an upstream error message into a single bounded line.
///
/// Response payloads (`text: ...`) and backtraces are elided, and anything shaped like a raw
/// 32-byte secret is redacted so node echoes of signed payloads never reach the logs.
pub fn compact_error_message(message: &str, max_len: usize) -> String {
    let mut raw = message.to_string();
    if let Some((prefix, _)) = raw.split_once(" text: ") {
        raw = format!("{prefix} text=<omitted>");
    }
    if let Some((prefix, _)) = raw.split_once("Stack backtrace:") {
        raw = prefix.to_string();
    }
    let raw = redact_secret_like_tokens(&raw);

    let mut compact = String::with_capacity(raw.len().min(max_len.saturating_add(16)));
    let mut prev_ws = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !prev_ws && !compact.is_empty() {
                compact.push(' ');
            }
            prev_ws = true;
            continue;
        }
        compact.push(ch);
        prev_ws = false;
        if compact.len() > max_len {
            break;
        }
    }
    if compact.len() <= max_len {
        compact
    } else {
        let mut cut = max_len;
        while !compact.is_char_boundary(cut) {
            cut -= 1;
        }
        compact.truncate(cut);
        compact.push_str("...(truncated)");
        compact
    }
}

/// Replace standalone `0x` + 64 hex tokens with a placeholder.
///
/// Transaction and block hashes share the shape; they are redacted too, which only costs
/// diagnostics in error text (hashes are reported through typed fields instead).
pub fn redact_secret_like_tokens(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let bytes = message.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'0' && matches!(bytes.get(i + 1), Some(b'x') | Some(b'X')) {
            let start = i + 2;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
                end += 1;
            }
            if end - start == 64 {
                out.push_str("0x<redacted>");
                i = end;
                continue;
            }
        }
        let ch_len = message[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        out.push_str(&message[i..i + ch_len]);
        i += ch_len;
    }
    out
}
