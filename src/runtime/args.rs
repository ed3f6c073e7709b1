use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Generate or load, compile, analyze, repair, then deploy.
    Pipeline,
    /// Same as `Pipeline` but requires a source file; never calls the language model.
    Deploy,
    /// Probe every configured endpoint and print the report.
    Health,
    /// Forward one JSON-RPC request read from stdin.
    Rpc,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::Deploy => "deploy",
            Self::Health => "health",
            Self::Rpc => "rpc",
        }
    }

    /// Only the full pipeline may generate or repair code through the language model.
    pub fn uses_language_model(self) -> bool {
        matches!(self, Self::Pipeline)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pipeline" => Some(Self::Pipeline),
            "deploy" => Some(Self::Deploy),
            "health" => Some(Self::Health),
            "rpc" => Some(Self::Rpc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeArgs {
    pub mode: RunMode,
    pub description: Option<String>,
    pub source_file: Option<PathBuf>,
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn mode_from_env() -> anyhow::Result<RunMode> {
    match env_value("PIPELINE_MODE") {
        None => Ok(RunMode::Pipeline),
        Some(raw) => RunMode::parse(&raw).ok_or_else(|| {
            anyhow::anyhow!(
                "invalid PIPELINE_MODE '{}' (expected pipeline, deploy, health or rpc)",
                raw
            )
        }),
    }
}

fn parse_runtime_args_from_iter<I, S>(args: I) -> anyhow::Result<RuntimeArgs>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let supplied_args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_string())
        .collect::<Vec<_>>();
    if !supplied_args.is_empty() {
        let joined = supplied_args.join(" ");
        return Err(anyhow::anyhow!(
            "CLI arguments are disabled in this build. Configure .env keys instead (PIPELINE_MODE, PIPELINE_NETWORK, CONTRACT_DESCRIPTION, CONTRACT_SOURCE_FILE). Received args: {}",
            joined
        ));
    }

    let mode = mode_from_env()?;
    let description = env_value("CONTRACT_DESCRIPTION");
    let source_file = env_value("CONTRACT_SOURCE_FILE").map(PathBuf::from);

    match mode {
        RunMode::Deploy if source_file.is_none() => Err(anyhow::anyhow!(
            "PIPELINE_MODE=deploy requires CONTRACT_SOURCE_FILE"
        )),
        RunMode::Pipeline if description.is_none() && source_file.is_none() => {
            Err(anyhow::anyhow!(
                "PIPELINE_MODE=pipeline requires CONTRACT_DESCRIPTION or CONTRACT_SOURCE_FILE"
            ))
        }
        _ => Ok(RuntimeArgs {
            mode,
            description,
            source_file,
        }),
    }
}

pub fn parse_runtime_args() -> anyhow::Result<RuntimeArgs> {
    parse_runtime_args_from_iter(std::env::args().skip(1))
}
