//! Configuration type definitions.
//!
//! The configuration is validated once at load time; the engine treats it as
//! an immutable, already-valid structure from then on. There is no runtime
//! scanner registry: the full list of [`ScannerSpec`]s is handed to the
//! orchestrator at call time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::ConfigError;
use crate::findings::Level;

/// Main configuration structure for omniscan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External scanners to run.
    pub scanners: Vec<ScannerSpec>,
    /// Suppression rules, applied in order after deduplication.
    #[serde(default)]
    pub suppressions: Vec<SuppressionRule>,
    /// Pass/fail thresholds.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Maximum number of scanners running at once. Defaults to the CPU
    /// count when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
    /// Abort remaining scanners once one fails with a non-timeout error.
    #[serde(default)]
    pub fail_fast: bool,
}

impl Config {
    /// The effective worker-pool size.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Scanners that are enabled, in configuration order.
    pub fn enabled_scanners(&self) -> impl Iterator<Item = &ScannerSpec> {
        self.scanners.iter().filter(|s| s.enabled)
    }

    /// Validate the configuration before any scanner is spawned.
    ///
    /// Misconfiguration is the only thing that aborts a run up front;
    /// everything that can go wrong later is localized per scanner.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scanners.iter().any(|s| s.enabled) {
            return Err(ConfigError::Validation(
                "at least one scanner must be enabled".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.scanners {
            if spec.name.is_empty() {
                return Err(ConfigError::Validation(
                    "scanner name must not be empty".to_string(),
                ));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate scanner name: {}",
                    spec.name
                )));
            }
            if spec.command.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "scanner {} has an empty command",
                    spec.name
                )));
            }
            if spec.timeout_seconds == 0 {
                return Err(ConfigError::Validation(format!(
                    "scanner {} has a zero timeout",
                    spec.name
                )));
            }
            for pattern in &spec.exclude_paths {
                glob::Pattern::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!(
                        "scanner {}: invalid exclude glob {:?}: {}",
                        spec.name, pattern, e
                    ))
                })?;
            }
        }

        if self.max_concurrency == Some(0) {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        for (idx, rule) in self.suppressions.iter().enumerate() {
            rule.validate()
                .map_err(|msg| ConfigError::Validation(format!("suppression #{}: {}", idx, msg)))?;
        }

        Ok(())
    }
}

/// Which built-in adapter translates a scanner's raw output into findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    /// SARIF 2.1.0 JSON on stdout (semgrep, checkov, grype, ...).
    #[default]
    Sarif,
    /// One JSON object per stdout line with `rule_id`/`level`/`message`/
    /// `file`/`line` keys.
    JsonLines,
}

/// One configured external scanner. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSpec {
    /// Unique scanner name, used for provenance and per-scanner status.
    pub name: String,
    /// Command as argv; the literal `{target}` expands to the scan root.
    pub command: Vec<String>,
    /// Output adapter for this tool.
    pub adapter: AdapterKind,
    pub enabled: bool,
    pub timeout_seconds: u64,
    /// Force every finding from this scanner to the given level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_override: Option<Level>,
    /// Glob patterns (relative to the scan root) whose findings are dropped
    /// during normalization.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_paths: Vec<String>,
}

impl Default for ScannerSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            command: Vec::new(),
            adapter: AdapterKind::default(),
            enabled: true,
            timeout_seconds: 300,
            severity_override: None,
            exclude_paths: Vec::new(),
        }
    }
}

/// User-configured exclusion matched against deduplicated findings.
///
/// A rule matches on an exact fingerprint, or on a rule id combined with a
/// path glob. Matching findings are removed from the report and counted in
/// `suppressed_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_path_glob: Option<String>,
    pub reason: String,
}

impl SuppressionRule {
    fn validate(&self) -> Result<(), String> {
        if let Some(pattern) = &self.match_path_glob {
            glob::Pattern::new(pattern).map_err(|e| format!("invalid glob {:?}: {}", pattern, e))?;
        }
        let has_pair = self.match_rule_id.is_some() && self.match_path_glob.is_some();
        if self.match_fingerprint.is_none() && !has_pair {
            return Err(
                "must set match_fingerprint, or both match_rule_id and match_path_glob".to_string(),
            );
        }
        Ok(())
    }
}

/// Severity threshold policy for the verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Fail the run when any finding at or above this level survives
    /// suppression.
    pub fail_on: Level,
    /// Also fail the run when a scanner could not be spawned at all.
    pub strict_spawn: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fail_on: Level::Error,
            strict_spawn: false,
        }
    }
}
