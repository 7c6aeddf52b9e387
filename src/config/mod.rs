//! Configuration loading and validation.
//!
//! Supplies the immutable inputs to the engine: which scanners to run, how
//! to interpret their output, which findings to suppress, and when the run
//! fails. Validated once here; never mutated afterwards.

mod error;
mod loading;
mod types;

pub use error::ConfigError;
pub use types::{AdapterKind, Config, ScannerSpec, SuppressionRule, Thresholds};
