//! Turns raw invocation output into canonical findings.
//!
//! Delegates the tool-specific parsing to the scanner's adapter, then stamps
//! provenance, normalizes paths against the scan root, applies the
//! per-scanner severity override, and drops findings in excluded paths.

use glob::Pattern;
use tracing::{debug, warn};

use crate::adapters::{AdapterParseError, ScannerAdapter};
use crate::config::ScannerSpec;
use crate::findings::Finding;
use crate::invocation::{InvocationState, ScanInvocation, ScanTarget};

/// Normalize one invocation's output.
///
/// `Succeeded` and `Failed` invocations are both parsed: a scanner may exit
/// non-zero (or hit a spawn-adjacent failure after producing output) and
/// still have emitted a valid findings payload. `TimedOut` and `Cancelled`
/// invocations normalize to nothing because their output is unreliable or
/// absent. An adapter error is returned to the caller, which records it on
/// the invocation's summary instead of discarding the whole run.
pub fn normalize(
    invocation: &ScanInvocation,
    adapter: &dyn ScannerAdapter,
    spec: &ScannerSpec,
    target: &ScanTarget,
) -> Result<Vec<Finding>, AdapterParseError> {
    match invocation.state {
        InvocationState::Succeeded | InvocationState::Failed => {}
        _ => return Ok(Vec::new()),
    }

    let parsed = adapter.parse(&invocation.stdout, &invocation.stderr, invocation.exit_code)?;
    debug!(
        scanner = %invocation.scanner,
        raw_findings = parsed.len(),
        "adapter parsed output"
    );

    let exclude = compiled_globs(&spec.exclude_paths, &invocation.scanner);
    let target_exclude = compiled_globs(&target.exclude_paths, &invocation.scanner);
    let include = compiled_globs(&target.include_paths, &invocation.scanner);

    let mut findings = Vec::new();
    for mut finding in parsed {
        finding.file_path = target.relativize(&finding.file_path);

        if matches_any(&exclude, &finding.file_path)
            || matches_any(&target_exclude, &finding.file_path)
        {
            continue;
        }
        if !include.is_empty() && !matches_any(&include, &finding.file_path) {
            continue;
        }

        finding.source_scanner = invocation.scanner.clone();
        if let Some(level) = spec.severity_override {
            finding.level = level;
        }
        findings.push(finding);
    }
    Ok(findings)
}

fn compiled_globs(patterns: &[String], scanner: &str) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                // Spec globs are validated at config load; target globs come
                // from the caller and are skipped if broken.
                warn!(scanner = %scanner, pattern = %p, error = %e, "skipping invalid glob");
                None
            }
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], path: &str) -> bool {
    patterns.iter().any(|p| p.matches(path))
}
