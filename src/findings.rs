//! Canonical finding schema shared by all scanner adapters.
//!
//! Every scanner's native output is translated into [`Finding`] values by an
//! adapter. From that point on the engine only deals in this one shape:
//! provenance stamping, deduplication, suppression, and reporting all operate
//! on `Finding` regardless of which tool produced it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Severity of a finding, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Note,
    #[default]
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Note => "note",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }

    /// Parse a SARIF-style level string. Unknown values map to `Warning`,
    /// which is also the SARIF default when `level` is absent.
    pub fn from_sarif(s: &str) -> Self {
        match s {
            "error" => Level::Error,
            "note" | "none" => Level::Note,
            _ => Level::Warning,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// One normalized security issue reported by a scanner.
///
/// Created by the normalizer from adapter output, immutable afterwards. The
/// `fingerprint` is filled in during aggregation (see [`fingerprint`]); two
/// findings with equal fingerprints are considered the same issue reported by
/// different tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
    pub rule_id: String,
    pub level: Level,
    pub message: String,
    /// Path relative to the scan root, `/`-separated.
    pub file_path: String,
    pub start_line: u64,
    pub end_line: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_scanner: String,
    /// The severity string as the tool itself reported it, before mapping
    /// onto [`Level`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_severity: Option<String>,
}

impl Finding {
    /// Create a finding as adapters do: without provenance or fingerprint,
    /// which the normalizer and aggregator fill in later.
    pub fn new(
        rule_id: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        file_path: impl Into<String>,
        start_line: u64,
        end_line: u64,
    ) -> Self {
        Self {
            fingerprint: String::new(),
            rule_id: rule_id.into(),
            level,
            message: message.into(),
            file_path: file_path.into(),
            start_line,
            end_line,
            source_scanner: String::new(),
            raw_severity: None,
        }
    }

    pub fn with_raw_severity(mut self, raw: impl Into<String>) -> Self {
        self.raw_severity = Some(raw.into());
        self
    }
}

/// Compute the deduplication fingerprint for a finding.
///
/// The hash covers (rule id, normalized file path, whitespace-collapsed
/// message) and nothing else. Line numbers are deliberately excluded so that
/// two tools reporting the same issue with slightly different spans still
/// collapse to one finding, and the source scanner is excluded so the dedup
/// works *across* scanners. Identical inputs always produce identical
/// fingerprints, independent of run order or timing.
pub fn fingerprint(rule_id: &str, file_path: &str, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(file_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(collapse_whitespace(message).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Collapse runs of whitespace to a single space and trim the ends.
/// Scanner messages often differ only in wrapping or indentation.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
