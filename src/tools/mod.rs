//! Narrow boundaries to the language model, the compiler and the static analyzer.

pub mod analyzer;
pub mod compiler;
pub mod llm;
pub mod source;

use crate::error::ToolError;
use crate::workflow::types::{CompileArtifact, DetectionReport, Finding};
use async_trait::async_trait;

pub use analyzer::SlitherAnalyzer;
pub use compiler::SolcCompiler;
pub use llm::ChatCompletionsAuthor;

/// Produces and repairs contract source. Returned code is already cleaned.
#[async_trait]
pub trait ContractAuthor: Send + Sync {
    async fn generate(&self, description: &str) -> Result<String, ToolError>;
    async fn repair(&self, code: &str, findings: &[Finding]) -> Result<String, ToolError>;
}

#[async_trait]
pub trait Compiler: Send + Sync {
    /// Empty bytecode is an error regardless of what the compiler reported.
    async fn compile(
        &self,
        source: &str,
        contract_name: Option<&str>,
    ) -> Result<CompileArtifact, ToolError>;
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, source: &str) -> Result<DetectionReport, ToolError>;
}
