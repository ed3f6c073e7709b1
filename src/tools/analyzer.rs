use crate::error::ToolError;
use crate::tools::Analyzer;
use crate::utils::error::compact_error_message;
use crate::workflow::types::{DetectionReport, Finding, Severity};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;

const CONTRACT_FILE: &str = "Contract.sol";
const REPORT_FILE: &str = "report.json";
static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// `slither <file> --json <report>` subprocess adapter.
pub struct SlitherAnalyzer {
    bin: String,
    work_dir: PathBuf,
    timeout: Duration,
}

/// Per-run directory, removed with everything in it when dropped.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(root: &Path) -> std::io::Result<Self> {
        let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = root.join(format!("analysis-{}-{}", std::process::id(), seq));
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(
                "[TOOLS] failed to remove analysis scratch dir {}: {}",
                self.path.display(),
                err
            );
        }
    }
}

impl SlitherAnalyzer {
    pub fn new(bin: impl Into<String>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            work_dir: work_dir.into(),
            timeout,
        }
    }
}

/// Map a slither JSON report onto findings bound to `source`.
pub fn parse_slither_report(report: &Value, source: &str) -> DetectionReport {
    let findings = report
        .pointer("/results/detectors")
        .and_then(Value::as_array)
        .map(|detectors| detectors.iter().map(finding_from_detector).collect())
        .unwrap_or_default();
    DetectionReport::new(findings, source)
}

fn finding_from_detector(detector: &Value) -> Finding {
    let text = |key: &str| detector.get(key).and_then(Value::as_str);
    Finding {
        kind: text("check").unwrap_or("unknown-detector").to_string(),
        line: detector
            .pointer("/elements/0/source_mapping/lines/0")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        severity: Severity::from_label(text("impact").unwrap_or("")),
        suggestion: text("description")
            .map(str::trim)
            .unwrap_or("see the detailed report")
            .to_string(),
        confidence: text("confidence").unwrap_or("Unknown").to_string(),
    }
}

#[async_trait]
impl Analyzer for SlitherAnalyzer {
    async fn analyze(&self, source: &str) -> Result<DetectionReport, ToolError> {
        let scratch = ScratchDir::create(&self.work_dir)?;
        let contract_path = scratch.path.join(CONTRACT_FILE);
        let report_path = scratch.path.join(REPORT_FILE);
        tokio::fs::write(&contract_path, source).await?;

        // slither exits non-zero whenever it reports findings; the report file is authoritative.
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.bin)
                .arg(CONTRACT_FILE)
                .arg("--json")
                .arg(REPORT_FILE)
                .current_dir(&scratch.path)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            ToolError::Analysis(format!("slither timed out after {}ms", self.timeout.as_millis()))
        })??;

        let raw = match tokio::fs::read(&report_path).await {
            Ok(raw) => raw,
            Err(_) => {
                return Err(ToolError::Analysis(format!(
                    "report not produced (exit {:?}): {}",
                    output.status.code(),
                    compact_error_message(&String::from_utf8_lossy(&output.stderr), 260)
                )))
            }
        };
        let parsed: Value = serde_json::from_slice(&raw)
            .map_err(|err| ToolError::Analysis(format!("unreadable slither report: {err}")))?;
        if parsed.get("success").and_then(Value::as_bool) == Some(false) {
            let message = parsed
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("slither reported failure");
            return Err(ToolError::Analysis(compact_error_message(message, 260)));
        }

        let report = parse_slither_report(&parsed, source);
        tracing::info!(
            "[TOOLS] analysis found {} issues (high={} medium={} low={})",
            report.summary.total,
            report.summary.high,
            report.summary.medium,
            report.summary.low
        );
        Ok(report)
    }
}
