pub mod gate;
pub mod store;
pub mod types;

pub use gate::{blocked_reason, is_deployable};
pub use store::WorkflowStore;
pub use types::{
    source_digest, CompileArtifact, DeployResult, DetectionReport, Finding, Severity,
    SeveritySummary, WorkflowState,
};
