use crate::config::networks::{EndpointRegistry, Network, NetworkConfig};
use crate::deploy::DeploySettings;
use crate::error::{ConfigError, Result};
use crate::rpc::proxy::DEFAULT_CALL_TIMEOUT_MS;
use crate::utils::secrets::{SecretSource, SecretString};
use alloy::primitives::U256;
use std::env;
use std::path::PathBuf;

pub const DEPLOYER_KEY_SECRET: &str = "DEPLOYER_PRIVATE_KEY";
pub const LLM_API_KEY_SECRET: &str = "LLM_API_KEY";

const DEFAULT_LLM_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "deepseek-chat";
const DEFAULT_LLM_TIMEOUT_MS: u64 = 120_000;

pub struct Config {
    pub network: Network,
    pub registry: EndpointRegistry,
    pub rpc_call_timeout_ms: u64,
    pub deploy: DeploySettings,
    pub deployer_key: Option<SecretString>,
    pub llm: LlmSettings,
    pub tools: ToolSettings,
    pub auto_repair: bool,
    pub max_repair_rounds: usize,
}

pub struct LlmSettings {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub solc_bin: String,
    pub slither_bin: String,
    pub work_dir: PathBuf,
}

fn validate_http_url(name: &str, raw: &str) -> Result<()> {
    let parsed = raw.parse::<reqwest::Url>().map_err(|e| {
        ConfigError::Invalid(format!("{name} must be a valid URL, got `{raw}`: {e}"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{name} must use http(s) scheme, got `{other}`"
        ))
        .into()),
    }
}

fn parse_bool_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|raw| parse_bool_flag(&raw))
        .unwrap_or(default)
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64_in(name: &str, range: std::ops::RangeInclusive<u64>, default: u64) -> Result<u64> {
    let Some(raw) = env_string(name) else {
        return Ok(default);
    };
    let parsed = raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!("{name} must be a valid u64, got `{raw}`"))
    })?;
    if !range.contains(&parsed) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be within {}..={}, got {parsed}",
            range.start(),
            range.end()
        ))
        .into());
    }
    Ok(parsed)
}

/// Split a comma-separated endpoint override, dropping blanks and duplicates while keeping order.
pub fn parse_endpoint_list(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(url.to_string()))
        .map(str::to_string)
        .collect()
}

fn load_registry() -> Result<EndpointRegistry> {
    let mut configs: Vec<NetworkConfig> = Vec::with_capacity(Network::ALL.len());
    for network in Network::ALL {
        let mut config = network.config();
        let key = format!("RPC_URLS_{}", network.as_str().to_ascii_uppercase());
        if let Some(raw) = env_string(&key) {
            let urls = parse_endpoint_list(&raw);
            for url in &urls {
                validate_http_url(&key, url)?;
            }
            if !urls.is_empty() {
                config.endpoints = urls;
            }
        }
        configs.push(config);
    }
    EndpointRegistry::new(configs)
}

impl Config {
    pub fn load(secrets: &dyn SecretSource) -> Result<Self> {
        let network = match env_string("PIPELINE_NETWORK") {
            Some(raw) => raw.parse::<Network>()?,
            None => Network::Sepolia,
        };
        let registry = load_registry()?;
        let rpc_call_timeout_ms =
            env_u64_in("RPC_CALL_TIMEOUT_MS", 250..=60_000, DEFAULT_CALL_TIMEOUT_MS)?;

        let defaults = DeploySettings::default();
        let min_balance_wei = match env_string("MIN_DEPLOY_BALANCE_WEI") {
            Some(raw) => raw.parse::<U256>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "MIN_DEPLOY_BALANCE_WEI must be a decimal wei amount, got `{raw}`"
                ))
            })?,
            None => defaults.min_balance_wei,
        };
        let gas_price_gwei = env_string("GAS_PRICE_GWEI");
        if let Some(raw) = gas_price_gwei.as_deref() {
            crate::deploy::gas::gwei_to_wei(raw)?;
        }
        let deploy = DeploySettings {
            default_gas_limit: env_u64_in(
                "DEFAULT_GAS_LIMIT",
                21_000..=30_000_000,
                defaults.default_gas_limit,
            )?,
            gas_price_gwei,
            min_balance_wei,
            confirmation_timeout_ms: env_u64_in(
                "CONFIRMATION_TIMEOUT_MS",
                1_000..=3_600_000,
                defaults.confirmation_timeout_ms,
            )?,
            confirmation_poll_ms: env_u64_in(
                "CONFIRMATION_POLL_MS",
                100..=60_000,
                defaults.confirmation_poll_ms,
            )?,
            allow_placeholder_artifact: env_flag(
                "ALLOW_PLACEHOLDER_ARTIFACT",
                defaults.allow_placeholder_artifact,
            ),
        };

        let llm_api_url = env_string("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.into());
        validate_http_url("LLM_API_URL", &llm_api_url)?;
        let llm = LlmSettings {
            api_url: llm_api_url,
            model: env_string("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
            api_key: secrets.secret(LLM_API_KEY_SECRET),
            timeout_ms: env_u64_in("LLM_TIMEOUT_MS", 1_000..=600_000, DEFAULT_LLM_TIMEOUT_MS)?,
        };

        let tools = ToolSettings {
            solc_bin: env_string("SOLC_BIN").unwrap_or_else(|| "solc".into()),
            slither_bin: env_string("SLITHER_BIN").unwrap_or_else(|| "slither".into()),
            work_dir: env_string("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("contract_pilot")),
        };

        let max_repair_rounds = env_u64_in("MAX_REPAIR_ROUNDS", 0..=5, 1)? as usize;

        Ok(Self {
            network,
            registry,
            rpc_call_timeout_ms,
            deploy,
            deployer_key: secrets.secret(DEPLOYER_KEY_SECRET),
            llm,
            tools,
            auto_repair: env_flag("AUTO_REPAIR", true),
            max_repair_rounds,
        })
    }
}
