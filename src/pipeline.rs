//! Stage driver: generate → compile → detect → (bounded auto-repair) → deploy.

use crate::deploy::{DeployOutcome, DeployRequest, Deployer};
use crate::error::{Result, ToolError};
use crate::tools::source::{clean_source, validate_source};
use crate::tools::{Analyzer, Compiler, ContractAuthor};
use crate::workflow::gate::blocked_reason;
use crate::workflow::types::WorkflowState;
use crate::workflow::WorkflowStore;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub auto_repair: bool,
    pub max_repair_rounds: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            auto_repair: true,
            max_repair_rounds: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PipelineInput {
    /// Natural-language request for the language model.
    Description(String),
    /// Ready Solidity source; cleaned the same way model output is.
    Source(String),
}

pub struct Pipeline {
    author: Option<Arc<dyn ContractAuthor>>,
    compiler: Arc<dyn Compiler>,
    analyzer: Arc<dyn Analyzer>,
    store: WorkflowStore,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        author: Option<Arc<dyn ContractAuthor>>,
        compiler: Arc<dyn Compiler>,
        analyzer: Arc<dyn Analyzer>,
        store: WorkflowStore,
        options: PipelineOptions,
    ) -> Self {
        Self {
            author,
            compiler,
            analyzer,
            store,
            options,
        }
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    fn author(&self) -> std::result::Result<&Arc<dyn ContractAuthor>, ToolError> {
        self.author
            .as_ref()
            .ok_or_else(|| ToolError::Model("no language model configured (LLM_API_KEY)".to_string()))
    }

    /// Put new code into the store; everything derived from older code is dropped.
    pub async fn ingest(&self, input: PipelineInput) -> Result<Arc<WorkflowState>> {
        let code = match input {
            PipelineInput::Description(description) => {
                self.author()?.generate(&description).await?
            }
            PipelineInput::Source(raw) => clean_source(&raw),
        };
        validate_source(&code)?;
        Ok(self.store.set_generated_code(code))
    }

    /// Compile and analyze the current generated code, publishing both results.
    pub async fn compile_and_detect(&self) -> Result<Arc<WorkflowState>> {
        let code = self.store.snapshot().generated_code.clone();
        let artifact = self.compiler.compile(&code, None).await?;
        self.store.set_compile_artifact(artifact);
        let report = self.analyzer.analyze(&code).await?;
        let state = self.store.set_detection_report(report);
        if let Some(reason) = state
            .detection_report
            .as_ref()
            .and_then(|r| blocked_reason(&r.summary))
        {
            tracing::warn!("[WORKFLOW] {}", reason);
        }
        Ok(state)
    }

    /// Up to `max_repair_rounds` repair → recompile → re-detect cycles, stopping once the gate passes.
    pub async fn auto_repair(&self) -> Result<Arc<WorkflowState>> {
        let mut state = self.store.snapshot();
        for round in 1..=self.options.max_repair_rounds {
            if state.is_ready_for_deployment {
                break;
            }
            let findings = state
                .governing_report()
                .map(|r| r.findings.clone())
                .unwrap_or_default();
            tracing::info!(
                "[WORKFLOW] auto-repair round {}/{} ({} findings)",
                round,
                self.options.max_repair_rounds,
                findings.len()
            );
            let repaired = self
                .author()?
                .repair(state.deployable_code(), &findings)
                .await?;
            validate_source(&repaired)?;
            let artifact = self.compiler.compile(&repaired, None).await?;
            let report = self.analyzer.analyze(&repaired).await?;
            self.store.set_repair_result(repaired, report);
            state = self.store.set_compile_artifact(artifact);
        }
        Ok(state)
    }

    /// Everything up to, but excluding, deployment.
    pub async fn prepare(&self, input: PipelineInput) -> Result<Arc<WorkflowState>> {
        self.ingest(input).await?;
        let mut state = self.compile_and_detect().await?;
        if !state.is_ready_for_deployment && self.options.auto_repair {
            state = self.auto_repair().await?;
        }
        Ok(state)
    }

    /// Full run. Deployment is always attempted; the orchestrator rejects gated code itself.
    pub async fn run(
        &self,
        input: PipelineInput,
        deployer: &Deployer,
        request: DeployRequest,
    ) -> Result<DeployOutcome> {
        self.prepare(input).await?;
        Ok(deployer.deploy(request).await)
    }
}
