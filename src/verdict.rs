//! Pass/fail determination.
//!
//! Pure and deterministic: the verdict is a function of the aggregated
//! severity counts, the per-scanner statuses, and the configured
//! thresholds. The exit codes for "findings over threshold" and "scanner
//! infrastructure failure" stay distinct so CI pipelines can branch on
//! them.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::invocation::{InvocationState, InvocationSummary};
use crate::report::SeverityCounts;

/// Nothing at or above the threshold.
pub const EXIT_PASS: u8 = 0;
/// Findings at or above the configured `fail_on` level.
pub const EXIT_FINDINGS: u8 = 1;
/// Scanner infrastructure failure under strict mode, or misconfiguration.
pub const EXIT_INFRA: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Fail => write!(f, "fail"),
        }
    }
}

/// Apply the threshold policy.
///
/// Findings over threshold dominate: a run that both found real issues and
/// lost a scanner reports the findings exit code, since that is the verdict
/// a human will act on first. Spawn-level failures fail the run only in
/// strict mode; a scanner exiting non-zero or timing out never does.
pub fn evaluate(
    counts: &SeverityCounts,
    statuses: &[InvocationSummary],
    thresholds: &Thresholds,
) -> (Verdict, u8) {
    if counts.at_or_above(thresholds.fail_on) > 0 {
        return (Verdict::Fail, EXIT_FINDINGS);
    }

    if thresholds.strict_spawn {
        let spawn_failed = statuses
            .iter()
            .any(|s| s.state == InvocationState::Failed && s.spawn_failure);
        if spawn_failed {
            return (Verdict::Fail, EXIT_INFRA);
        }
    }

    (Verdict::Pass, EXIT_PASS)
}
