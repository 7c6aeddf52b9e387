pub mod adapters;
pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod findings;
pub mod invocation;
pub mod normalizer;
pub mod orchestrator;
pub mod process;
pub mod report;
pub mod reporter;
pub mod run;
pub mod verdict;

pub use cli::{Cli, OutputFormat};
pub use config::{AdapterKind, Config, ConfigError, ScannerSpec, SuppressionRule, Thresholds};
pub use error::{InvocationError, OrchestratorError, Result};
pub use findings::{Finding, Level};
pub use invocation::{InvocationState, InvocationSummary, ScanInvocation, ScanTarget};
pub use report::{AggregatedReport, SeverityCounts};
pub use reporter::{json::JsonReporter, terminal::TerminalReporter, Reporter};
pub use run::run_scan;
pub use verdict::{Verdict, EXIT_FINDINGS, EXIT_INFRA, EXIT_PASS};
