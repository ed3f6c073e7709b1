use crate::workflow::gate;
use crate::workflow::types::{CompileArtifact, DeployResult, DetectionReport, WorkflowState};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Versioned single-writer cell holding the pipeline snapshot.
///
/// Every mutation clones the current snapshot, applies the change, bumps `version` and publishes
/// the new `Arc` to all subscribers. Readers never observe a partially applied mutation.
#[derive(Clone)]
pub struct WorkflowStore {
    tx: Arc<watch::Sender<Arc<WorkflowState>>>,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(WorkflowState::default()));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<WorkflowState> {
        self.tx.borrow().clone()
    }

    /// Live stream of snapshots; yields the current one first.
    pub fn subscribe(&self) -> WatchStream<Arc<WorkflowState>> {
        WatchStream::new(self.tx.subscribe())
    }

    fn replace(&self, apply: impl FnOnce(&mut WorkflowState)) -> Arc<WorkflowState> {
        let mut published = None;
        self.tx.send_modify(|current| {
            let mut next = (**current).clone();
            apply(&mut next);
            next.version = current.version.saturating_add(1);
            let next = Arc::new(next);
            published = Some(next.clone());
            *current = next;
        });
        published.unwrap_or_else(|| self.snapshot())
    }

    /// New code body: everything derived from the previous body is dropped and readiness resets.
    pub fn set_generated_code(&self, code: impl Into<String>) -> Arc<WorkflowState> {
        let code = code.into();
        let next = self.replace(|state| {
            state.generated_code = code;
            state.compile_artifact = None;
            state.detection_report = None;
            state.repaired_code.clear();
            state.final_detection_report = None;
            state.is_ready_for_deployment = false;
            state.deployment_result = None;
            state.code_revision = state.code_revision.saturating_add(1);
        });
        tracing::debug!(
            "[WORKFLOW] generated code set (version={} revision={})",
            next.version,
            next.code_revision
        );
        next
    }

    pub fn set_compile_artifact(&self, artifact: CompileArtifact) -> Arc<WorkflowState> {
        self.replace(|state| state.compile_artifact = Some(artifact))
    }

    /// Latest report for the generated code. Any earlier repair outcome no longer applies.
    ///
    /// Dropping a repaired body changes the deployable code, so the revision moves with it.
    pub fn set_detection_report(&self, mut report: DetectionReport) -> Arc<WorkflowState> {
        let ready = gate::evaluate(&mut report);
        let next = self.replace(|state| {
            if !state.repaired_code.is_empty() {
                state.code_revision = state.code_revision.saturating_add(1);
                state.deployment_result = None;
            }
            state.detection_report = Some(report);
            state.repaired_code.clear();
            state.final_detection_report = None;
            state.is_ready_for_deployment = ready;
        });
        tracing::info!(
            "[WORKFLOW] detection report recorded: ready={} version={}",
            next.is_ready_for_deployment,
            next.version
        );
        next
    }

    /// Repaired body plus the report computed against it; readiness follows the final report.
    ///
    /// The compile artifact of the pre-repair body is dropped; callers publish the recompiled
    /// artifact afterwards.
    pub fn set_repair_result(
        &self,
        repaired_code: impl Into<String>,
        mut final_report: DetectionReport,
    ) -> Arc<WorkflowState> {
        let repaired_code = repaired_code.into();
        let ready = gate::evaluate(&mut final_report);
        let next = self.replace(|state| {
            state.repaired_code = repaired_code;
            state.final_detection_report = Some(final_report);
            state.compile_artifact = None;
            state.deployment_result = None;
            state.is_ready_for_deployment = ready;
            state.code_revision = state.code_revision.saturating_add(1);
        });
        tracing::info!(
            "[WORKFLOW] repair result recorded: ready={} revision={}",
            next.is_ready_for_deployment,
            next.code_revision
        );
        next
    }

    pub fn set_deployment_result(&self, result: DeployResult) -> Arc<WorkflowState> {
        self.replace(|state| state.deployment_result = Some(result))
    }

    /// Write the result only if the code body is still the one the attempt started from.
    pub fn set_deployment_result_for(&self, code_revision: u64, result: DeployResult) -> bool {
        let written = self.tx.send_if_modified(|current| {
            if current.code_revision != code_revision {
                return false;
            }
            let mut next = (**current).clone();
            next.deployment_result = Some(result);
            next.version = current.version.saturating_add(1);
            *current = Arc::new(next);
            true
        });
        if !written {
            tracing::warn!(
                "[WORKFLOW] dropped stale deployment result for revision {}",
                code_revision
            );
        }
        written
    }

    /// Back to the empty snapshot. Subscribers stay registered; counters keep increasing.
    pub fn reset(&self) -> Arc<WorkflowState> {
        self.replace(|state| {
            let code_revision = state.code_revision.saturating_add(1);
            *state = WorkflowState {
                code_revision,
                ..WorkflowState::default()
            };
        })
    }
}
