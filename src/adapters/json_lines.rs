//! JSON-lines output adapter.
//!
//! For wrapping ad hoc tools: the scanner prints one JSON object per stdout
//! line. Blank lines are skipped; anything else must parse.

use serde::Deserialize;

use super::{AdapterParseError, ScannerAdapter};
use crate::findings::{Finding, Level};

pub struct JsonLinesAdapter;

#[derive(Deserialize)]
struct JsonLineFinding {
    rule_id: String,
    #[serde(default)]
    level: Level,
    message: String,
    file: String,
    line: u64,
    end_line: Option<u64>,
    severity: Option<String>,
}

impl ScannerAdapter for JsonLinesAdapter {
    fn parse(
        &self,
        stdout: &[String],
        _stderr: &[String],
        _exit_code: Option<i32>,
    ) -> Result<Vec<Finding>, AdapterParseError> {
        let mut findings = Vec::new();
        for (idx, line) in stdout.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parsed: JsonLineFinding = serde_json::from_str(line).map_err(|e| {
                AdapterParseError::Structure(format!("stdout line {}: {}", idx + 1, e))
            })?;
            let mut finding = Finding::new(
                parsed.rule_id,
                parsed.level,
                parsed.message,
                parsed.file,
                parsed.line,
                parsed.end_line.unwrap_or(parsed.line),
            );
            if let Some(raw) = parsed.severity {
                finding = finding.with_raw_severity(raw);
            }
            findings.push(finding);
        }
        Ok(findings)
    }
}
