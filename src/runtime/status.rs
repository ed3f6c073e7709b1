use crate::config::networks::NetworkConfig;
use crate::rpc::EndpointHealth;
use crate::runtime::RuntimeArgs;
use crate::utils::config::Config;
use crate::workflow::types::{DeployResult, WorkflowState};

pub fn emit_runtime_status(args: &RuntimeArgs, config: &Config) {
    let input = match (&args.source_file, &args.description) {
        (Some(path), _) => format!("source-file:{}", path.display()),
        (None, Some(_)) => "description".to_string(),
        (None, None) => "none".to_string(),
    };
    tracing::info!(
        "[OPS] Runtime resolved: mode={} network={} input={} auto_repair={} max_repair_rounds={} llm={} signer={}",
        args.mode.as_str(),
        config.network,
        input,
        config.auto_repair,
        config.max_repair_rounds,
        if config.llm.api_key.is_some() { "configured" } else { "missing" },
        if config.deployer_key.is_some() { "configured" } else { "missing" }
    );
    for network in config.registry.iter() {
        tracing::info!(
            "[OPS] {} (chain {}): {} endpoint(s)",
            network.name,
            network.chain_id,
            network.endpoints.len()
        );
    }
}

/// One line per endpoint plus a per-network tally.
pub fn emit_health_status(report: &[EndpointHealth]) {
    let healthy = report.iter().filter(|h| h.healthy).count();
    for entry in report {
        if entry.healthy {
            tracing::info!(
                "[OPS] {} {} healthy latency={}ms block={}",
                entry.network,
                entry.endpoint,
                entry.latency_ms,
                entry
                    .block_number
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "?".to_string())
            );
        } else {
            tracing::warn!(
                "[OPS] {} {} unhealthy latency={}ms error={}",
                entry.network,
                entry.endpoint,
                entry.latency_ms,
                entry.error.as_deref().unwrap_or("unknown")
            );
        }
    }
    tracing::info!(
        "[OPS] Endpoint health: {}/{} healthy",
        healthy,
        report.len()
    );
}

pub fn emit_pipeline_status(state: &WorkflowState) {
    let Some(report) = state.governing_report() else {
        tracing::warn!("[OPS] Pipeline finished without a detection report");
        return;
    };
    tracing::info!(
        "[OPS] Pipeline gate: ready={} high={} medium={} low={} informational={} optimization={} repaired={}",
        state.is_ready_for_deployment,
        report.summary.high,
        report.summary.medium,
        report.summary.low,
        report.summary.informational,
        report.summary.optimization,
        !state.repaired_code.is_empty()
    );
}

pub fn emit_deploy_status(network: &NetworkConfig, result: &DeployResult) {
    if result.success {
        let address = result.contract_address.as_deref().unwrap_or("?");
        tracing::info!(
            "[OPS] Deployed to {} at {} block={} gas_used={} explorer={}",
            network.name,
            address,
            result.block_number.unwrap_or_default(),
            result.gas_used.unwrap_or_default(),
            network.address_url(address)
        );
        return;
    }
    match result.tx_hash.as_deref() {
        Some(tx_hash) => tracing::error!(
            "[OPS] Deployment on {} failed: {} (tx {})",
            network.name,
            result.error.as_deref().unwrap_or("unknown error"),
            network.tx_url(tx_hash)
        ),
        None => tracing::error!(
            "[OPS] Deployment on {} failed: {}",
            network.name,
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}
