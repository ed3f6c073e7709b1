use crate::workflow::types::{DetectionReport, Severity, SeveritySummary};

/// Deployable iff no high, medium or low findings remain. An absent report is never deployable.
pub fn is_deployable(report: Option<&DetectionReport>) -> bool {
    match report {
        Some(report) => summary_is_deployable(&SeveritySummary::from_findings(&report.findings)),
        None => false,
    }
}

pub fn summary_is_deployable(summary: &SeveritySummary) -> bool {
    summary.high == 0 && summary.medium == 0 && summary.low == 0
}

/// Recompute the report summary in place and return the gate verdict.
pub fn evaluate(report: &mut DetectionReport) -> bool {
    let summary = report.recompute_summary();
    summary_is_deployable(&summary)
}

/// Stable message naming the blocking counts, or `None` when the summary passes the gate.
pub fn blocked_reason(summary: &SeveritySummary) -> Option<String> {
    let parts: Vec<String> = Severity::ALL
        .iter()
        .filter(|severity| severity.blocks_deployment())
        .filter_map(|severity| {
            let count = summary.count(*severity);
            (count > 0).then(|| {
                let noun = if count == 1 { "finding" } else { "findings" };
                format!("{count} {severity}-severity {noun}")
            })
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("deployment blocked: {}", parts.join(", ")))
}
