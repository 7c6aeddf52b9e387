//! SARIF 2.1.0 output adapter.
//!
//! Covers the common denominator most scanners emit: `runs[].results[]`
//! with `ruleId`, `level`, `message.text`, and a physical location. Fields
//! outside that subset are ignored.

use serde::Deserialize;

use super::{AdapterParseError, ScannerAdapter};
use crate::findings::{Finding, Level};

pub struct SarifAdapter;

#[derive(Deserialize)]
struct SarifLog {
    #[serde(default)]
    runs: Vec<SarifRun>,
}

#[derive(Deserialize)]
struct SarifRun {
    #[serde(default)]
    results: Vec<SarifResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: Option<String>,
    level: Option<String>,
    message: SarifMessage,
    #[serde(default)]
    locations: Vec<SarifLocation>,
}

#[derive(Deserialize)]
struct SarifMessage {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: Option<SarifPhysicalLocation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: Option<SarifArtifactLocation>,
    region: Option<SarifRegion>,
}

#[derive(Deserialize)]
struct SarifArtifactLocation {
    uri: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: Option<u64>,
    end_line: Option<u64>,
}

impl ScannerAdapter for SarifAdapter {
    fn parse(
        &self,
        stdout: &[String],
        _stderr: &[String],
        _exit_code: Option<i32>,
    ) -> Result<Vec<Finding>, AdapterParseError> {
        let body = stdout.join("\n");
        if body.trim().is_empty() {
            // A clean run with nothing to report is valid SARIF-less output
            // for several tools.
            return Ok(Vec::new());
        }

        let log: SarifLog = serde_json::from_str(&body)?;

        let mut findings = Vec::new();
        for run in log.runs {
            for result in run.results {
                let raw_level = result.level.clone();
                let level = result
                    .level
                    .as_deref()
                    .map(Level::from_sarif)
                    .unwrap_or(Level::Warning);

                let (file_path, start_line, end_line) = location_of(&result);
                let message = result
                    .message
                    .text
                    .unwrap_or_else(|| "(no message)".to_string());
                let rule_id = result.rule_id.unwrap_or_else(|| "unknown-rule".to_string());

                let mut finding =
                    Finding::new(rule_id, level, message, file_path, start_line, end_line);
                if let Some(raw) = raw_level {
                    finding = finding.with_raw_severity(raw);
                }
                findings.push(finding);
            }
        }
        Ok(findings)
    }
}

fn location_of(result: &SarifResult) -> (String, u64, u64) {
    let physical = result
        .locations
        .first()
        .and_then(|l| l.physical_location.as_ref());

    let file = physical
        .and_then(|p| p.artifact_location.as_ref())
        .and_then(|a| a.uri.clone())
        .unwrap_or_else(|| "(unknown)".to_string());

    let start = physical
        .and_then(|p| p.region.as_ref())
        .and_then(|r| r.start_line)
        .unwrap_or(0);
    let end = physical
        .and_then(|p| p.region.as_ref())
        .and_then(|r| r.end_line)
        .unwrap_or(start);

    (file, start, end)
}
