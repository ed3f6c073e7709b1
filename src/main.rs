use anyhow::Context;
use contract_pilot::deploy::{DeployRequest, Deployer, SigningKey};
use contract_pilot::pipeline::{Pipeline, PipelineInput, PipelineOptions};
use contract_pilot::rpc::{FailoverProxy, JsonRpcRequest};
use contract_pilot::runtime::{
    emit_deploy_status, emit_health_status, emit_pipeline_status, emit_runtime_status,
    parse_runtime_args, RunMode, RuntimeArgs,
};
use contract_pilot::tools::{Analyzer, ChatCompletionsAuthor, Compiler, ContractAuthor};
use contract_pilot::tools::{SlitherAnalyzer, SolcCompiler};
use contract_pilot::utils::config::Config;
use contract_pilot::utils::secrets::{EnvSecrets, SecretString};
use contract_pilot::workflow::WorkflowStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

const TOOL_TIMEOUT: Duration = Duration::from_secs(120);

async fn run_health(proxy: &FailoverProxy) -> anyhow::Result<()> {
    let report = proxy.health_check().await;
    emit_health_status(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_forward(proxy: &FailoverProxy, config: &Config) -> anyhow::Result<()> {
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("failed to read JSON-RPC request from stdin")?;
    let request: JsonRpcRequest =
        serde_json::from_str(raw.trim()).context("stdin is not a JSON-RPC request")?;
    let response = proxy.forward(config.network.as_str(), request).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

async fn run_pipeline(
    args: &RuntimeArgs,
    config: Config,
    proxy: FailoverProxy,
) -> anyhow::Result<()> {
    let input = match &args.source_file {
        Some(path) => PipelineInput::Source(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => PipelineInput::Description(args.description.clone().unwrap_or_default()),
    };

    let uses_model = args.mode.uses_language_model();
    let author: Option<Arc<dyn ContractAuthor>> = if uses_model {
        ChatCompletionsAuthor::from_settings(&config.llm)
            .map(|author| Arc::new(author) as Arc<dyn ContractAuthor>)
    } else {
        None
    };
    let compiler: Arc<dyn Compiler> =
        Arc::new(SolcCompiler::new(config.tools.solc_bin.clone(), TOOL_TIMEOUT));
    let analyzer: Arc<dyn Analyzer> = Arc::new(SlitherAnalyzer::new(
        config.tools.slither_bin.clone(),
        config.tools.work_dir.clone(),
        TOOL_TIMEOUT,
    ));

    let store = WorkflowStore::new();
    let pipeline = Pipeline::new(
        author,
        compiler,
        analyzer,
        store.clone(),
        PipelineOptions {
            auto_repair: config.auto_repair && uses_model,
            max_repair_rounds: config.max_repair_rounds,
        },
    );
    let network = proxy.network(config.network.as_str()).clone();
    let deployer = Deployer::new(proxy, store.clone(), config.deploy.clone());

    // A missing key still goes through the orchestrator so the failure is recorded as a result.
    let signing_key = SigningKey::new(
        config
            .deployer_key
            .unwrap_or_else(|| SecretString::new(String::new())),
    );
    let request = DeployRequest::new(config.network, signing_key);

    let outcome = pipeline.run(input, &deployer, request).await?;
    emit_pipeline_status(&store.snapshot());
    emit_deploy_status(&network, &outcome.result);
    println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    if !outcome.result.success {
        anyhow::bail!(
            "deployment failed: {}",
            outcome.result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Validate environment files and load defaults before runtime initialization.
    contract_pilot::utils::env_guard::harden_env_setup();

    // Runtime is env-driven; PIPELINE_MODE selects what runs.
    let runtime_args = parse_runtime_args()?;

    match std::env::var("RUST_LOG") {
        Ok(val) => println!("[STARTUP] RUST_LOG is set to: '{}'", val),
        Err(_) => println!("[STARTUP] RUST_LOG is unset."),
    }

    // Default to `info` when `RUST_LOG` is unset or invalid to avoid silent startup.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        println!("[STARTUP] RUST_LOG invalid or unset; defaulting to 'info'");
        tracing_subscriber::EnvFilter::new("info")
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    println!("[STARTUP] Tracing initialized.");

    let config = Config::load(&EnvSecrets)?;
    emit_runtime_status(&runtime_args, &config);

    let proxy = FailoverProxy::http(
        config.registry.clone(),
        Duration::from_millis(config.rpc_call_timeout_ms),
    );

    match runtime_args.mode {
        RunMode::Health => run_health(&proxy).await,
        RunMode::Rpc => run_forward(&proxy, &config).await,
        RunMode::Pipeline | RunMode::Deploy => run_pipeline(&runtime_args, config, proxy).await,
    }
}
