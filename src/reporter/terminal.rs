use colored::Colorize;

use crate::findings::{Finding, Level};
use crate::invocation::{InvocationState, InvocationSummary};
use crate::report::AggregatedReport;
use crate::reporter::Reporter;
use crate::verdict::Verdict;

pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn level_label(&self, level: Level) -> colored::ColoredString {
        let label = format!("[{}]", level);
        match level {
            Level::Error => label.red().bold(),
            Level::Warning => label.yellow(),
            Level::Note => label.white(),
        }
    }

    fn state_label(&self, summary: &InvocationSummary) -> colored::ColoredString {
        match summary.state {
            InvocationState::Succeeded => "ok".green(),
            InvocationState::Failed => "failed".red().bold(),
            InvocationState::TimedOut => "timed out".yellow().bold(),
            InvocationState::Cancelled => "cancelled".white().dimmed(),
            InvocationState::Pending | InvocationState::Running => {
                summary.state.as_str().white()
            }
        }
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}:{}: {} {}: {}\n",
            finding.file_path,
            finding.start_line,
            self.level_label(finding.level),
            finding.rule_id,
            finding.message
        ));
        output.push_str(&format!(
            "  Source: {}\n",
            finding.source_scanner.dimmed()
        ));
        if self.verbose {
            output.push_str(&format!("  Fingerprint: {}\n", finding.fingerprint.dimmed()));
            if let Some(ref raw) = finding.raw_severity {
                output.push_str(&format!("  Reported severity: {}\n", raw));
            }
        }
        output
    }

    fn format_scanner_table(&self, report: &AggregatedReport) -> String {
        let mut output = String::new();
        output.push_str("Scanners:\n");
        for (name, summary) in &report.per_scanner_status {
            let duration = summary
                .duration_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "  {:20} {:10} {:>8}",
                name,
                self.state_label(summary),
                duration
            ));
            if let Some(ref error) = summary.error {
                output.push_str(&format!("  {}", error.red()));
            }
            output.push('\n');
        }
        output
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, report: &AggregatedReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n",
            format!("omniscan v{}", report.version).bold()
        ));
        output.push_str(&format!("Target: {}\n\n", report.target));

        output.push_str(&self.format_scanner_table(report));
        output.push('\n');

        if report.findings.is_empty() {
            output.push_str(&"No findings.\n".green().to_string());
        } else {
            for finding in &report.findings {
                output.push_str(&self.format_finding(finding));
                output.push('\n');
            }
        }

        output.push_str(&format!("{}\n", "━".repeat(50)));
        output.push_str(&format!(
            "Summary: {} error(s), {} warning(s), {} note(s)",
            report.severity_counts.error.to_string().red().bold(),
            report.severity_counts.warning.to_string().yellow(),
            report.severity_counts.note
        ));
        if report.suppressed_count > 0 {
            output.push_str(&format!(", {} suppressed", report.suppressed_count));
        }
        output.push('\n');

        match report.verdict {
            Verdict::Pass => output.push_str(&format!("{}\n", "PASS".green().bold())),
            Verdict::Fail => output.push_str(&format!("{}\n", "FAIL".red().bold())),
        }

        output
    }
}
