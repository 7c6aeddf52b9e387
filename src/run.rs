//! End-to-end scan pipeline.
//!
//! Wires the stages together: orchestrate all enabled scanners, normalize
//! each invocation's output through its adapter, aggregate and suppress,
//! evaluate the verdict, and assemble the final report.

use std::time::Duration;

use tracing::{info, warn};

use crate::adapters;
use crate::aggregator;
use crate::config::Config;
use crate::error::Result;
use crate::invocation::ScanTarget;
use crate::normalizer;
use crate::orchestrator::Orchestrator;
use crate::report::AggregatedReport;
use crate::verdict;

/// Run a full scan and produce the aggregate report.
///
/// The config is assumed validated (loading validates); per-scanner
/// failures are localized into the report's `per_scanner_status`, and the
/// report always lists every enabled scanner even on total failure of some.
pub async fn run_scan(
    config: &Config,
    target: &ScanTarget,
    deadline: Option<Duration>,
) -> Result<AggregatedReport> {
    let orchestrator = Orchestrator::new(config.effective_concurrency())
        .with_fail_fast(config.fail_fast)
        .with_deadline(deadline);

    let invocations = orchestrator.run_all(&config.scanners, target).await?;

    let mut all_findings = Vec::new();
    let mut statuses = Vec::new();
    for mut invocation in invocations {
        // run_all only returns invocations for configured scanners.
        let Some(spec) = config.scanners.iter().find(|s| s.name == invocation.scanner) else {
            continue;
        };
        let adapter = adapters::builtin(spec.adapter);
        match normalizer::normalize(&invocation, adapter.as_ref(), spec, target) {
            Ok(findings) => {
                info!(
                    scanner = %invocation.scanner,
                    state = %invocation.state,
                    findings = findings.len(),
                    "scanner normalized"
                );
                all_findings.extend(findings);
            }
            Err(e) => {
                // Malformed output costs this scanner its findings, not the
                // run; the parse error is visible in the scanner's status.
                warn!(scanner = %invocation.scanner, error = %e, "adapter parse failed");
                invocation.record_parse_error(e.into());
            }
        }
        statuses.push(invocation.summary());
    }

    let aggregation = aggregator::aggregate(all_findings, &config.suppressions);
    let (verdict, exit_code) = verdict::evaluate(
        &aggregation.severity_counts,
        &statuses,
        &config.thresholds,
    );

    info!(
        verdict = %verdict,
        exit_code,
        findings = aggregation.findings.len(),
        suppressed = aggregation.suppressed_count,
        "scan complete"
    );

    Ok(AggregatedReport::new(
        &target.root.to_string_lossy(),
        aggregation,
        statuses,
        verdict,
        exit_code,
    ))
}
