//! Error types for omniscan.
//!
//! Per-scanner problems are [`InvocationError`]s: they are recorded on the
//! invocation that hit them and never abort the run. Only problems that make
//! the whole run meaningless before any process is spawned surface as
//! [`OrchestratorError`].

use crate::adapters::AdapterParseError;
use crate::config::ConfigError;
use thiserror::Error;

/// A failure scoped to a single scanner invocation.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The scanner binary could not be started at all (missing, not
    /// executable). Distinct from a non-zero exit, which is a normal
    /// "findings present" signal for most tools.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The scanner ran past its timeout and was killed. A tolerated
    /// outcome, not a bug; partial output is considered unreliable.
    #[error("scanner timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The adapter could not make sense of the scanner's output. The
    /// invocation keeps its exit status but contributes zero findings.
    #[error("failed to parse scanner output: {0}")]
    Parse(#[from] AdapterParseError),

    /// The invocation was cancelled (fail-fast or global deadline) before
    /// it started.
    #[error("cancelled before start")]
    Cancelled,
}

impl InvocationError {
    /// True for spawn-level failures, which strict mode treats as an
    /// infrastructure problem worth failing the whole run over.
    pub fn is_spawn(&self) -> bool {
        matches!(self, InvocationError::Spawn { .. })
    }
}

/// A failure that aborts the whole run before any scanner is spawned.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no enabled scanners to run")]
    NoScannersEnabled,

    /// A worker task panicked or was aborted by the runtime. Indicates a
    /// bug in the engine itself, never a scanner problem.
    #[error("scanner worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
