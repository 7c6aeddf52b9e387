//! The aggregate report handed to reporters and CI.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregation;
use crate::findings::{Finding, Level};
use crate::invocation::InvocationSummary;
use crate::verdict::Verdict;

/// Finding counts per severity level, over non-suppressed findings only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub note: usize,
}

impl SeverityCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.level {
                Level::Error => counts.error += 1,
                Level::Warning => counts.warning += 1,
                Level::Note => counts.note += 1,
            }
        }
        counts
    }

    /// Total findings at or above `level`.
    pub fn at_or_above(&self, level: Level) -> usize {
        match level {
            Level::Error => self.error,
            Level::Warning => self.error + self.warning,
            Level::Note => self.error + self.warning + self.note,
        }
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.note
    }
}

/// The one immutable result of a scan run.
///
/// Contains every configured scanner's status even when some scanners
/// failed, so the verdict is always explainable. Created once at the end of
/// a run and never mutated.
#[derive(Debug, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub version: String,
    /// RFC 3339 creation time. Excluded from determinism guarantees.
    pub generated_at: String,
    pub target: String,
    pub verdict: Verdict,
    pub exit_code: u8,
    pub severity_counts: SeverityCounts,
    pub suppressed_count: usize,
    pub per_scanner_status: BTreeMap<String, InvocationSummary>,
    pub findings: Vec<Finding>,
}

impl AggregatedReport {
    pub fn new(
        target: &str,
        aggregation: Aggregation,
        statuses: Vec<InvocationSummary>,
        verdict: Verdict,
        exit_code: u8,
    ) -> Self {
        let per_scanner_status = statuses
            .into_iter()
            .map(|s| (s.scanner.clone(), s))
            .collect();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            target: target.to_string(),
            verdict,
            exit_code,
            severity_counts: aggregation.severity_counts,
            suppressed_count: aggregation.suppressed_count,
            per_scanner_status,
            findings: aggregation.findings,
        }
    }
}
