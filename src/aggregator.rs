//! Cross-scanner finding aggregation.
//!
//! Merges findings from every scanner into one deduplicated set, applies
//! suppression rules, and computes severity counts. The output is a pure
//! function of the inputs: no part of it depends on scanner execution
//! order, concurrency, or timing, and the finding list is sorted so report
//! diffs between runs stay stable.

use std::collections::BTreeMap;

use glob::Pattern;
use thiserror::Error;
use tracing::debug;

use crate::config::SuppressionRule;
use crate::findings::{self, Finding, Level};
use crate::report::SeverityCounts;

/// An internal bug in deduplication. Should be unreachable; checked loudly
/// in tests and with debug assertions, never silently swallowed.
#[derive(Debug, Error)]
#[error("aggregation invariant violated: {0}")]
pub struct InvariantViolation(pub String);

/// The deduplicated, suppression-filtered view of all findings.
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Sorted by (file path, start line, rule id); no two entries share a
    /// fingerprint.
    pub findings: Vec<Finding>,
    pub severity_counts: SeverityCounts,
    pub suppressed_count: usize,
}

/// Aggregate all scanners' findings.
///
/// Dedup keeps one representative per fingerprint, preferring the higher
/// [`Level`] and, on a tie, the lexicographically first source scanner.
/// "First seen" would depend on concurrency timing and is deliberately not
/// used. Suppression rules are then tested in order against each
/// representative; the first match removes it and bumps `suppressed_count`.
pub fn aggregate(all_findings: Vec<Finding>, suppressions: &[SuppressionRule]) -> Aggregation {
    // BTreeMap keyed by fingerprint gives a deterministic iteration order
    // for free.
    let mut by_fingerprint: BTreeMap<String, Finding> = BTreeMap::new();
    for mut finding in all_findings {
        finding.fingerprint =
            findings::fingerprint(&finding.rule_id, &finding.file_path, &finding.message);
        match by_fingerprint.get_mut(&finding.fingerprint) {
            Some(existing) => {
                if prefer(&finding, existing) {
                    *existing = finding;
                }
            }
            None => {
                by_fingerprint.insert(finding.fingerprint.clone(), finding);
            }
        }
    }

    let compiled: Vec<CompiledSuppression> =
        suppressions.iter().map(CompiledSuppression::new).collect();

    let mut kept = Vec::new();
    let mut suppressed_count = 0usize;
    for finding in by_fingerprint.into_values() {
        if let Some(rule) = compiled.iter().find(|r| r.matches(&finding)) {
            debug!(
                fingerprint = %finding.fingerprint,
                rule_id = %finding.rule_id,
                reason = %rule.reason,
                "finding suppressed"
            );
            suppressed_count += 1;
        } else {
            kept.push(finding);
        }
    }

    kept.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then(a.start_line.cmp(&b.start_line))
            .then(a.rule_id.cmp(&b.rule_id))
    });

    debug_assert!(check_invariants(&kept).is_ok());

    let severity_counts = SeverityCounts::from_findings(&kept);
    Aggregation {
        findings: kept,
        severity_counts,
        suppressed_count,
    }
}

/// True when `candidate` should replace `incumbent` as the representative
/// for a shared fingerprint.
fn prefer(candidate: &Finding, incumbent: &Finding) -> bool {
    match candidate.level.cmp(&incumbent.level) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.source_scanner < incumbent.source_scanner,
    }
}

/// Verify the post-dedup invariant: no two findings share a fingerprint.
pub fn check_invariants(findings: &[Finding]) -> Result<(), InvariantViolation> {
    let mut seen = std::collections::HashSet::new();
    for finding in findings {
        if !seen.insert(finding.fingerprint.as_str()) {
            return Err(InvariantViolation(format!(
                "duplicate fingerprint survived dedup: {}",
                finding.fingerprint
            )));
        }
    }
    Ok(())
}

struct CompiledSuppression {
    fingerprint: Option<String>,
    rule_id: Option<String>,
    path_glob: Option<Pattern>,
    reason: String,
}

impl CompiledSuppression {
    fn new(rule: &SuppressionRule) -> Self {
        Self {
            fingerprint: rule.match_fingerprint.clone(),
            rule_id: rule.match_rule_id.clone(),
            // Globs are validated at config load time.
            path_glob: rule
                .match_path_glob
                .as_deref()
                .and_then(|p| Pattern::new(p).ok()),
            reason: rule.reason.clone(),
        }
    }

    /// A rule matches on an exact fingerprint, or on rule id and path glob
    /// both matching.
    fn matches(&self, finding: &Finding) -> bool {
        if let Some(fp) = &self.fingerprint {
            if *fp == finding.fingerprint {
                return true;
            }
        }
        match (&self.rule_id, &self.path_glob) {
            (Some(rule_id), Some(glob)) => {
                *rule_id == finding.rule_id && glob.matches(&finding.file_path)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(rule: &str, file: &str, level: Level, scanner: &str) -> Finding {
        let mut f = Finding::new(rule, level, format!("{} issue", rule), file, 10, 10);
        f.source_scanner = scanner.to_string();
        f
    }

    fn suppression_by_rule(rule_id: &str, glob: &str) -> SuppressionRule {
        SuppressionRule {
            match_rule_id: Some(rule_id.to_string()),
            match_path_glob: Some(glob.to_string()),
            reason: "test".to_string(),
            ..SuppressionRule::default()
        }
    }

    #[test]
    fn test_duplicates_across_scanners_merge() {
        // Two scanners, same rule, same file: the higher level and its
        // scanner win.
        let findings = vec![
            finding("SQLI", "src/app.py", Level::Error, "scanner-a"),
            finding("SQLI", "src/app.py", Level::Warning, "scanner-b"),
        ];
        let agg = aggregate(findings, &[]);
        assert_eq!(agg.findings.len(), 1);
        assert_eq!(agg.findings[0].level, Level::Error);
        assert_eq!(agg.findings[0].source_scanner, "scanner-a");
        assert_eq!(agg.severity_counts.error, 1);
        assert_eq!(agg.severity_counts.warning, 0);
    }

    #[test]
    fn test_level_tie_breaks_on_scanner_name() {
        let findings = vec![
            finding("SQLI", "src/app.py", Level::Error, "zzz"),
            finding("SQLI", "src/app.py", Level::Error, "aaa"),
        ];
        let agg = aggregate(findings, &[]);
        assert_eq!(agg.findings[0].source_scanner, "aaa");
    }

    #[test]
    fn test_different_rules_on_same_line_both_kept() {
        let findings = vec![
            finding("SQLI", "src/app.py", Level::Error, "a"),
            finding("XSS", "src/app.py", Level::Error, "a"),
        ];
        let agg = aggregate(findings, &[]);
        assert_eq!(agg.findings.len(), 2);
    }

    #[test]
    fn test_order_independence() {
        let forward = vec![
            finding("SQLI", "src/app.py", Level::Error, "a"),
            finding("XSS", "src/web.py", Level::Warning, "b"),
            finding("SQLI", "src/app.py", Level::Warning, "b"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let agg_fwd = aggregate(forward, &[]);
        let agg_rev = aggregate(reversed, &[]);

        let keys = |agg: &Aggregation| {
            agg.findings
                .iter()
                .map(|f| (f.fingerprint.clone(), f.level, f.source_scanner.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&agg_fwd), keys(&agg_rev));
        assert_eq!(agg_fwd.severity_counts, agg_rev.severity_counts);
    }

    #[test]
    fn test_idempotence() {
        let input = vec![
            finding("SQLI", "src/app.py", Level::Error, "a"),
            finding("SQLI", "src/app.py", Level::Warning, "b"),
        ];
        let once = aggregate(input.clone(), &[]);
        let twice = aggregate(once.findings.clone(), &[]);
        assert_eq!(once.findings.len(), twice.findings.len());
        assert_eq!(once.severity_counts, twice.severity_counts);
        assert_eq!(
            once.findings[0].fingerprint,
            twice.findings[0].fingerprint
        );
    }

    #[test]
    fn test_findings_sorted_for_stable_diffs() {
        let findings = vec![
            finding("B", "z.py", Level::Note, "s"),
            finding("A", "a.py", Level::Note, "s"),
            finding("Z", "a.py", Level::Note, "s"),
        ];
        let agg = aggregate(findings, &[]);
        let order: Vec<_> = agg
            .findings
            .iter()
            .map(|f| (f.file_path.as_str(), f.rule_id.as_str()))
            .collect();
        assert_eq!(order, vec![("a.py", "A"), ("a.py", "Z"), ("z.py", "B")]);
    }

    #[test]
    fn test_suppression_by_rule_and_glob() {
        let findings = vec![
            finding("SQLI", "tests/fixture.py", Level::Error, "a"),
            finding("SQLI", "src/app.py", Level::Error, "a"),
        ];
        let rules = vec![suppression_by_rule("SQLI", "tests/**")];
        let agg = aggregate(findings, &rules);
        assert_eq!(agg.findings.len(), 1);
        assert_eq!(agg.findings[0].file_path, "src/app.py");
        assert_eq!(agg.suppressed_count, 1);
    }

    #[test]
    fn test_suppression_requires_both_rule_and_glob_to_match() {
        let findings = vec![finding("XSS", "tests/fixture.py", Level::Error, "a")];
        let rules = vec![suppression_by_rule("SQLI", "tests/**")];
        let agg = aggregate(findings, &rules);
        assert_eq!(agg.findings.len(), 1);
        assert_eq!(agg.suppressed_count, 0);
    }

    #[test]
    fn test_suppression_by_fingerprint() {
        let f = finding("SQLI", "src/app.py", Level::Error, "a");
        let fp = findings::fingerprint(&f.rule_id, &f.file_path, &f.message);
        let rules = vec![SuppressionRule {
            match_fingerprint: Some(fp),
            reason: "reviewed".to_string(),
            ..SuppressionRule::default()
        }];
        let agg = aggregate(vec![f], &rules);
        assert!(agg.findings.is_empty());
        assert_eq!(agg.suppressed_count, 1);
    }

    #[test]
    fn test_suppressed_duplicate_counted_once() {
        // Both scanners report it, dedup first, then suppression counts the
        // single representative.
        let findings = vec![
            finding("SQLI", "src/app.py", Level::Error, "a"),
            finding("SQLI", "src/app.py", Level::Warning, "b"),
        ];
        let rules = vec![suppression_by_rule("SQLI", "src/**")];
        let agg = aggregate(findings, &rules);
        assert_eq!(agg.suppressed_count, 1);
        assert!(agg.findings.is_empty());
    }

    #[test]
    fn test_severity_counts_exclude_suppressed() {
        let findings = vec![
            finding("SQLI", "src/app.py", Level::Error, "a"),
            finding("NOTE-1", "src/app.py", Level::Note, "a"),
        ];
        let rules = vec![suppression_by_rule("SQLI", "src/**")];
        let agg = aggregate(findings, &rules);
        assert_eq!(agg.severity_counts.error, 0);
        assert_eq!(agg.severity_counts.note, 1);
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate(Vec::new(), &[]);
        assert!(agg.findings.is_empty());
        assert_eq!(agg.suppressed_count, 0);
        assert_eq!(agg.severity_counts, SeverityCounts::default());
    }

    #[test]
    fn test_check_invariants_detects_duplicates() {
        let mut a = finding("SQLI", "src/app.py", Level::Error, "a");
        a.fingerprint = "same".to_string();
        let mut b = finding("XSS", "src/web.py", Level::Error, "a");
        b.fingerprint = "same".to_string();
        assert!(check_invariants(&[a, b]).is_err());
    }

    #[test]
    fn test_aggregate_output_passes_invariant_check() {
        let findings = vec![
            finding("SQLI", "src/app.py", Level::Error, "a"),
            finding("SQLI", "src/app.py", Level::Warning, "b"),
            finding("XSS", "src/web.py", Level::Warning, "b"),
        ];
        let agg = aggregate(findings, &[]);
        assert!(check_invariants(&agg.findings).is_ok());
    }
}
