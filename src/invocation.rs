//! Scanner invocation state machine.
//!
//! One [`ScanInvocation`] exists per (scanner, target) pair. The orchestrator
//! is the only component that creates them or drives their transitions:
//! `Pending → Running → {Succeeded, Failed, TimedOut, Cancelled}`. Terminal
//! states are final. The invocation itself is discarded once its findings
//! are extracted, but its [`InvocationSummary`] survives into the report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::InvocationError;

/// The filesystem tree being scanned. Shared read-only by every scanner
/// subprocess.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub root: PathBuf,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
}

impl ScanTarget {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
        }
    }

    pub fn with_exclude_paths(mut self, patterns: Vec<String>) -> Self {
        self.exclude_paths = patterns;
        self
    }

    /// Strip the scan root from an absolute path and normalize separators,
    /// so findings compare equal across scanners that report paths
    /// differently.
    pub fn relativize(&self, path: &str) -> String {
        let p = Path::new(path);
        let stripped = p.strip_prefix(&self.root).unwrap_or(p);
        let s = stripped.to_string_lossy().replace('\\', "/");
        s.trim_start_matches("./").to_string()
    }
}

/// Lifecycle state of a scanner invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl InvocationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvocationState::Pending | InvocationState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationState::Pending => "pending",
            InvocationState::Running => "running",
            InvocationState::Succeeded => "succeeded",
            InvocationState::Failed => "failed",
            InvocationState::TimedOut => "timed_out",
            InvocationState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for InvocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scanner run against one target.
#[derive(Debug)]
pub struct ScanInvocation {
    pub scanner: String,
    pub state: InvocationState,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub error: Option<InvocationError>,
}

impl ScanInvocation {
    pub fn new(scanner: impl Into<String>) -> Self {
        Self {
            scanner: scanner.into(),
            state: InvocationState::Pending,
            started_at: None,
            ended_at: None,
            exit_code: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            error: None,
        }
    }

    /// `Pending → Running`.
    pub fn start(&mut self) {
        debug_assert_eq!(self.state, InvocationState::Pending);
        self.state = InvocationState::Running;
        self.started_at = Some(Utc::now());
    }

    /// `Running → Succeeded`, keeping the raw output for normalization.
    pub fn succeed(&mut self, exit_code: Option<i32>, stdout: Vec<String>, stderr: Vec<String>) {
        debug_assert_eq!(self.state, InvocationState::Running);
        self.state = InvocationState::Succeeded;
        self.exit_code = exit_code;
        self.stdout = stdout;
        self.stderr = stderr;
        self.ended_at = Some(Utc::now());
    }

    /// `Running → Failed`.
    pub fn fail(&mut self, error: InvocationError) {
        debug_assert_eq!(self.state, InvocationState::Running);
        self.state = InvocationState::Failed;
        self.error = Some(error);
        self.ended_at = Some(Utc::now());
    }

    /// `Running → TimedOut`. Partial output is dropped: a killed scanner's
    /// output is unreliable.
    pub fn time_out(&mut self, timeout_secs: u64) {
        debug_assert_eq!(self.state, InvocationState::Running);
        self.state = InvocationState::TimedOut;
        self.error = Some(InvocationError::Timeout { timeout_secs });
        self.ended_at = Some(Utc::now());
    }

    /// `Pending → Cancelled` (fail-fast or deadline, before starting).
    pub fn cancel(&mut self) {
        debug_assert_eq!(self.state, InvocationState::Pending);
        self.state = InvocationState::Cancelled;
        self.error = Some(InvocationError::Cancelled);
    }

    /// Record an adapter parse failure discovered during normalization.
    /// The state (and exit code) are kept; only the error is surfaced.
    pub fn record_parse_error(&mut self, error: InvocationError) {
        self.error = Some(error);
    }

    pub fn summary(&self) -> InvocationSummary {
        let duration_ms = match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => {
                Some((end - start).num_milliseconds().max(0) as u64)
            }
            _ => None,
        };
        InvocationSummary {
            scanner: self.scanner.clone(),
            state: self.state,
            exit_code: self.exit_code,
            duration_ms,
            error: self.error.as_ref().map(|e| e.to_string()),
            spawn_failure: self.error.as_ref().is_some_and(|e| e.is_spawn()),
        }
    }
}

/// What the final report retains about an invocation after the invocation
/// itself is discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationSummary {
    pub scanner: String,
    pub state: InvocationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the scanner binary could not be started at all; strict
    /// mode turns this into an infrastructure failure.
    #[serde(default)]
    pub spawn_failure: bool,
}
