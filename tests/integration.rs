#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    cargo_bin_cmd!("omniscan")
}

fn write_config(dir: &Path, content: &str) {
    fs::write(dir.join(".omniscan.yaml"), content).unwrap();
}

/// A scanner command that prints one finding in the json-lines shape.
fn emit_cmd(rule: &str, level: &str, file: &str) -> String {
    format!(
        r#"["sh", "-c", "echo '{{\"rule_id\": \"{}\", \"level\": \"{}\", \"message\": \"issue {}\", \"file\": \"{}\", \"line\": 7}}'"]"#,
        rule, level, rule, file
    )
}

mod verdicts {
    use super::*;

    #[test]
    fn test_clean_run_exits_zero() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            r#"
scanners:
  - name: quiet
    command: ["true"]
    adapter: json-lines
"#,
        );

        cmd()
            .arg(dir.path())
            .assert()
            .success()
            .code(0)
            .stdout(predicate::str::contains("PASS"))
            .stdout(predicate::str::contains("No findings."));
    }

    #[test]
    fn test_error_finding_exits_one() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: strict-tool
    command: {}
    adapter: json-lines
"#,
                emit_cmd("SQLI-001", "error", "src/db.py")
            ),
        );

        cmd()
            .arg(dir.path())
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("SQLI-001"))
            .stdout(predicate::str::contains("FAIL"));
    }

    #[test]
    fn test_warning_below_threshold_passes() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: lint-tool
    command: {}
    adapter: json-lines
"#,
                emit_cmd("LINT-001", "warning", "src/app.py")
            ),
        );

        cmd()
            .arg(dir.path())
            .assert()
            .success()
            .code(0)
            .stdout(predicate::str::contains("1 warning(s)"))
            .stdout(predicate::str::contains("PASS"));
    }

    #[test]
    fn test_fail_on_flag_lowers_threshold() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: lint-tool
    command: {}
    adapter: json-lines
"#,
                emit_cmd("LINT-001", "warning", "src/app.py")
            ),
        );

        cmd()
            .arg(dir.path())
            .args(["--fail-on", "warning"])
            .assert()
            .failure()
            .code(1);
    }
}

mod aggregation {
    use super::*;

    #[test]
    fn test_same_finding_from_two_scanners_is_merged() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: tool-a
    command: {}
    adapter: json-lines
  - name: tool-b
    command: {}
    adapter: json-lines
"#,
                emit_cmd("SQLI-001", "error", "src/db.py"),
                emit_cmd("SQLI-001", "error", "src/db.py")
            ),
        );

        cmd()
            .arg(dir.path())
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("1 error(s)"));
    }

    #[test]
    fn test_suppression_removes_finding() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: strict-tool
    command: {}
    adapter: json-lines
suppressions:
  - match_rule_id: SQLI-001
    match_path_glob: "tests/**"
    reason: fixtures are intentionally vulnerable
"#,
                emit_cmd("SQLI-001", "error", "tests/fixtures/db.py")
            ),
        );

        cmd()
            .arg(dir.path())
            .assert()
            .success()
            .code(0)
            .stdout(predicate::str::contains("1 suppressed"))
            .stdout(predicate::str::contains("PASS"));
    }
}

mod scanner_failures {
    use super::*;

    #[test]
    fn test_timeout_does_not_fail_the_run() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            r#"
scanners:
  - name: hung-tool
    command: ["sleep", "30"]
    adapter: json-lines
    timeout_seconds: 1
"#,
        );

        cmd()
            .arg(dir.path())
            .assert()
            .success()
            .code(0)
            .stdout(predicate::str::contains("timed out"))
            .stdout(predicate::str::contains("PASS"));
    }

    #[test]
    fn test_missing_binary_is_tolerated_by_default() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: ghost-tool
    command: ["definitely-not-a-real-binary-3f9a"]
    adapter: json-lines
  - name: strict-tool
    command: {}
    adapter: json-lines
"#,
                emit_cmd("SQLI-001", "error", "src/db.py")
            ),
        );

        // Sibling findings still decide the verdict.
        cmd()
            .arg(dir.path())
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("SQLI-001"));
    }

    #[test]
    fn test_missing_binary_fails_run_under_strict() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            r#"
scanners:
  - name: ghost-tool
    command: ["definitely-not-a-real-binary-3f9a"]
    adapter: json-lines
"#,
        );

        cmd().arg(dir.path()).arg("--strict").assert().code(2);
    }

    #[test]
    fn test_nonzero_exit_is_not_a_failure() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            r#"
scanners:
  - name: findings-exit-tool
    command: ["sh", "-c", "exit 3"]
    adapter: json-lines
"#,
        );

        cmd()
            .arg(dir.path())
            .assert()
            .success()
            .code(0)
            .stdout(predicate::str::contains("ok"));
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_missing_config_exits_two() {
        let dir = TempDir::new().unwrap();

        cmd()
            .arg(dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("no config file found"));
    }

    #[test]
    fn test_invalid_config_exits_two() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), "scanners: []\n");

        cmd()
            .arg(dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("at least one scanner"));
    }

    #[test]
    fn test_explicit_config_flag() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("custom.yaml");
        fs::write(
            &config_path,
            r#"
scanners:
  - name: quiet
    command: ["true"]
    adapter: json-lines
"#,
        )
        .unwrap();

        cmd()
            .arg(dir.path())
            .arg("--config")
            .arg(&config_path)
            .assert()
            .success()
            .code(0);
    }
}

mod output {
    use super::*;

    #[test]
    fn test_json_format_is_machine_readable() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: strict-tool
    command: {}
    adapter: json-lines
"#,
                emit_cmd("SQLI-001", "error", "src/db.py")
            ),
        );

        let output = cmd()
            .arg(dir.path())
            .args(["--format", "json"])
            .assert()
            .failure()
            .code(1)
            .get_output()
            .stdout
            .clone();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["verdict"], "fail");
        assert_eq!(parsed["exit_code"], 1);
        assert_eq!(parsed["findings"][0]["rule_id"], "SQLI-001");
        assert_eq!(parsed["severity_counts"]["error"], 1);
        assert!(parsed["per_scanner_status"]["strict-tool"].is_object());
    }

    #[test]
    fn test_output_file_is_written() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            r#"
scanners:
  - name: quiet
    command: ["true"]
    adapter: json-lines
"#,
        );
        let report_path = dir.path().join("report.json");

        cmd()
            .arg(dir.path())
            .args(["--format", "json"])
            .arg("--output")
            .arg(&report_path)
            .assert()
            .success()
            .code(0);

        let content = fs::read_to_string(&report_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["verdict"], "pass");
    }

    #[test]
    fn test_sarif_scanner_end_to_end() {
        let dir = TempDir::new().unwrap();
        let sarif = r#"{"version": "2.1.0", "runs": [{"results": [{"ruleId": "CKV_AWS_20", "level": "error", "message": {"text": "S3 bucket is public"}, "locations": [{"physicalLocation": {"artifactLocation": {"uri": "main.tf"}, "region": {"startLine": 12}}}]}]}]}"#;
        let sarif_file = dir.path().join("out.sarif");
        fs::write(&sarif_file, sarif).unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
scanners:
  - name: iac-tool
    command: ["cat", "{}"]
    adapter: sarif
"#,
                sarif_file.display()
            ),
        );

        cmd()
            .arg(dir.path())
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("CKV_AWS_20"))
            .stdout(predicate::str::contains("main.tf:12"));
    }
}
