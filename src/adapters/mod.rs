//! Scanner output adapters.
//!
//! An adapter is a pure function from one tool's raw process output to the
//! canonical [`Finding`](crate::findings::Finding) shape. There is no shared
//! base state between adapters, only this contract; each tool gets its own
//! implementation.

mod json_lines;
mod sarif;

pub use json_lines::JsonLinesAdapter;
pub use sarif::SarifAdapter;

use crate::config::AdapterKind;
use crate::findings::Finding;
use thiserror::Error;

/// Raised when a scanner's output cannot be translated into findings.
#[derive(Error, Debug)]
pub enum AdapterParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected output structure: {0}")]
    Structure(String),
}

/// Translates one tool's raw output into canonical findings.
///
/// Implementations must be pure: no filesystem access, no retained state.
/// `exit_code` is provided because some tools encode "findings present" in
/// it; `None` means the process was killed before exiting.
pub trait ScannerAdapter: Send + Sync {
    fn parse(
        &self,
        stdout: &[String],
        stderr: &[String],
        exit_code: Option<i32>,
    ) -> Result<Vec<Finding>, AdapterParseError>;
}

/// Construct the built-in adapter for a configured kind.
pub fn builtin(kind: AdapterKind) -> Box<dyn ScannerAdapter> {
    match kind {
        AdapterKind::Sarif => Box::new(SarifAdapter),
        AdapterKind::JsonLines => Box::new(JsonLinesAdapter),
    }
}
