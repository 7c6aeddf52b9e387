use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::findings::Level;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "omniscan",
    version,
    about = "Orchestrates third-party security scanners and aggregates their findings",
    long_about = "omniscan runs a configured set of external security scanners against a \
                  target tree, normalizes their output into one finding schema, merges \
                  duplicates across tools, and reports a pass/fail verdict for CI."
)]
pub struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub target: PathBuf,

    /// Config file (default: .omniscan.{yaml,yml,json,toml} in the target)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum scanners running at once (overrides config)
    #[arg(short = 'j', long)]
    pub max_jobs: Option<usize>,

    /// Fail when findings at or above this level survive suppression
    /// (overrides config)
    #[arg(long, value_enum)]
    pub fail_on: Option<Level>,

    /// Abort remaining scanners once one fails to launch
    #[arg(long)]
    pub fail_fast: bool,

    /// Overall wall-clock budget in seconds for the whole run
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Treat scanner launch failures as a failed run
    #[arg(long)]
    pub strict: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
