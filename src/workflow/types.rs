use alloy::primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity labels reported by the static analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
    Informational,
    Optimization,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
        Severity::Optimization,
    ];

    /// Map an analyzer impact label. Unrecognized labels are treated as `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            "informational" | "info" => Self::Informational,
            "optimization" => Self::Optimization,
            _ => Self::Medium,
        }
    }

    pub fn blocks_deployment(self) -> bool {
        matches!(self, Self::High | Self::Medium | Self::Low)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Informational => "informational",
            Self::Optimization => "optimization",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: String,
    pub line: u64,
    pub severity: Severity,
    pub suggestion: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub informational: usize,
    pub optimization: usize,
    pub total: usize,
}

impl SeveritySummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Informational => summary.informational += 1,
                Severity::Optimization => summary.optimization += 1,
            }
        }
        summary.total =
            summary.high + summary.medium + summary.low + summary.informational + summary.optimization;
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Informational => self.informational,
            Severity::Optimization => self.optimization,
        }
    }
}

/// Keccak-256 of the exact source text a report or artifact was produced from.
pub fn source_digest(source: &str) -> B256 {
    keccak256(source.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub findings: Vec<Finding>,
    pub summary: SeveritySummary,
    pub source_digest: B256,
}

impl DetectionReport {
    pub fn new(findings: Vec<Finding>, source: &str) -> Self {
        let summary = SeveritySummary::from_findings(&findings);
        Self {
            findings,
            summary,
            source_digest: source_digest(source),
        }
    }

    /// Overwrite `summary` from the finding list; upstream counts are never trusted.
    pub fn recompute_summary(&mut self) -> SeveritySummary {
        self.summary = SeveritySummary::from_findings(&self.findings);
        self.summary
    }

    pub fn covers(&self, source: &str) -> bool {
        self.source_digest == source_digest(source)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileArtifact {
    pub success: bool,
    pub abi: Value,
    pub bytecode: String,
    pub deployed_bytecode: String,
    pub contract_name: String,
}

impl CompileArtifact {
    /// Bytecode is present and not the empty-contract sentinel.
    pub fn is_deployable(&self) -> bool {
        has_deployable_bytecode(&self.bytecode)
    }
}

pub fn has_deployable_bytecode(bytecode: &str) -> bool {
    let trimmed = bytecode.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    !body.is_empty()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeployResult {
    pub fn failed(error: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self {
            success: false,
            tx_hash,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// One immutable snapshot of the pipeline. Replaced wholesale on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub generated_code: String,
    pub compile_artifact: Option<CompileArtifact>,
    pub detection_report: Option<DetectionReport>,
    pub repaired_code: String,
    pub final_detection_report: Option<DetectionReport>,
    pub is_ready_for_deployment: bool,
    pub deployment_result: Option<DeployResult>,
    pub version: u64,
    pub code_revision: u64,
}

impl WorkflowState {
    /// The report that governs readiness: the post-repair report when one exists.
    pub fn governing_report(&self) -> Option<&DetectionReport> {
        self.final_detection_report
            .as_ref()
            .or(self.detection_report.as_ref())
    }

    /// The code body a deployment would ship: repaired code when present.
    pub fn deployable_code(&self) -> &str {
        if self.repaired_code.trim().is_empty() {
            &self.generated_code
        } else {
            &self.repaired_code
        }
    }
}
