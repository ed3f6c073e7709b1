use std::fs;
use std::path::Path;

fn write_minimal_env_template(file: &mut fs::File) -> std::io::Result<()> {
    use std::io::Write;
    writeln!(file, "# Contract Pilot configuration")?;
    writeln!(file)?;
    writeln!(file, "PIPELINE_NETWORK=\"sepolia\"")?;
    writeln!(file, "PIPELINE_MODE=\"pipeline\"")?;
    writeln!(file, "# CONTRACT_DESCRIPTION=\"ERC20 token with capped supply\"")?;
    writeln!(file, "# CONTRACT_SOURCE_FILE=\"contracts/Token.sol\"")?;
    writeln!(file, "# RPC_URLS_SEPOLIA=\"https://rpc.sepolia.org,https://ethereum-sepolia-rpc.publicnode.com\"")?;
    writeln!(file, "# LLM_API_KEY=\"CHANGE_ME\"")?;
    writeln!(file, "# DEPLOYER_PRIVATE_KEY=\"0x...\"")?;
    writeln!(file)?;
    writeln!(file, "RUST_LOG=\"info,contract_pilot=info\"")?;
    Ok(())
}

/// Parse `.env` content into key/value pairs, honoring comments and matching quotes.
pub fn parse_dot_env(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = value.trim();
        let parsed = if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            &value[1..value.len() - 1]
        } else {
            value.split(" #").next().unwrap_or("").trim()
        };
        pairs.push((key.to_string(), parsed.to_string()));
    }
    pairs
}

fn load_dot_env() {
    let path = Path::new(".env");
    if !path.exists() {
        return;
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ENV] Failed to read .env: {}", e);
            return;
        }
    };

    for (key, value) in parse_dot_env(&content) {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(key, value);
    }
}

fn ensure_env_example_exists() {
    let env_example = Path::new(".env.example");
    if !env_example.exists() {
        if let Ok(mut file) = fs::File::create(env_example) {
            let _ = write_minimal_env_template(&mut file);
        }
    }
}

/// Load `.env` defaults (process environment wins) and warn about missing essentials.
///
/// Unlike `.env.example`, a real `.env` is never generated: it is where secrets live.
pub fn harden_env_setup() {
    ensure_env_example_exists();
    load_dot_env();
    if std::env::var("LLM_API_KEY").is_err() {
        eprintln!("[ENV] WARN: LLM_API_KEY is not set; generation and repair are unavailable");
    }
    if std::env::var("DEPLOYER_PRIVATE_KEY").is_err() {
        eprintln!("[ENV] WARN: DEPLOYER_PRIVATE_KEY is not set; deployment will be refused");
    }
}
