use std::fs;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use omniscan::reporter::{json::JsonReporter, terminal::TerminalReporter, Reporter};
use omniscan::verdict::EXIT_INFRA;
use omniscan::{run_scan, Cli, Config, OutputFormat, ScanTarget};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("omniscan: {}", e);
            return ExitCode::from(EXIT_INFRA);
        }
    };

    // CLI flags override the file.
    if let Some(jobs) = cli.max_jobs {
        config.max_concurrency = Some(jobs);
    }
    if let Some(level) = cli.fail_on {
        config.thresholds.fail_on = level;
    }
    if cli.fail_fast {
        config.fail_fast = true;
    }
    if cli.strict {
        config.thresholds.strict_spawn = true;
    }
    if let Err(e) = config.validate() {
        eprintln!("omniscan: {}", e);
        return ExitCode::from(EXIT_INFRA);
    }

    let target = ScanTarget::new(&cli.target);
    let deadline = cli.deadline.map(Duration::from_secs);

    let report = match run_scan(&config, &target, deadline).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            eprintln!("omniscan: {}", e);
            return ExitCode::from(EXIT_INFRA);
        }
    };

    let reporter: Box<dyn Reporter> = match cli.format {
        OutputFormat::Terminal => Box::new(TerminalReporter::new(cli.verbose)),
        OutputFormat::Json => Box::new(JsonReporter::new()),
    };
    let rendered = reporter.report(&report);

    if let Some(ref path) = cli.output {
        if let Err(e) = fs::write(path, &rendered) {
            eprintln!("omniscan: failed to write {}: {}", path.display(), e);
            return ExitCode::from(EXIT_INFRA);
        }
    } else {
        print!("{}", rendered);
    }

    ExitCode::from(report.exit_code)
}

fn load_config(cli: &Cli) -> Result<Config, omniscan::ConfigError> {
    match cli.config {
        Some(ref path) => Config::from_file(path),
        None => Config::discover(&cli.target),
    }
}
