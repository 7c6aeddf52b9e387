//! Concurrent scanner scheduling.
//!
//! Runs every enabled scanner against the target with bounded parallelism
//! (a semaphore-disciplined worker pool, not one thread per scanner) and
//! drives each invocation through its state machine. The default policy is
//! continue-on-error: one scanner crashing or timing out never cancels its
//! siblings. Fail-fast mode cancels invocations that have not started once
//! any scanner fails with a non-timeout error; running ones are left to
//! finish or hit their own timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ScannerSpec;
use crate::error::{InvocationError, OrchestratorError, Result};
use crate::invocation::{ScanInvocation, ScanTarget};
use crate::process;

/// Schedules scanner invocations and collects their terminal states.
pub struct Orchestrator {
    max_concurrency: usize,
    fail_fast: bool,
    deadline: Option<Duration>,
}

impl Orchestrator {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            fail_fast: false,
            deadline: None,
        }
    }

    /// Cancel not-yet-started invocations after the first non-timeout
    /// failure.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Overall wall-clock budget for the whole run. Invocations still
    /// pending when it expires are cancelled; running ones get the
    /// remaining budget as their effective timeout.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run all enabled scanners. Returns only once every invocation has
    /// reached a terminal state, sorted by scanner name so callers see a
    /// deterministic order regardless of scheduling.
    pub async fn run_all(
        &self,
        specs: &[ScannerSpec],
        target: &ScanTarget,
    ) -> Result<Vec<ScanInvocation>> {
        let enabled: Vec<ScannerSpec> = specs.iter().filter(|s| s.enabled).cloned().collect();
        if enabled.is_empty() {
            return Err(OrchestratorError::NoScannersEnabled);
        }

        info!(
            scanners = enabled.len(),
            max_concurrency = self.max_concurrency,
            fail_fast = self.fail_fast,
            "starting scan run"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let abort = Arc::new(AtomicBool::new(false));
        let deadline_at = self.deadline.map(|d| Instant::now() + d);
        let fail_fast = self.fail_fast;

        let mut tasks = JoinSet::new();
        for spec in enabled {
            let semaphore = Arc::clone(&semaphore);
            let abort = Arc::clone(&abort);
            let target = target.clone();
            tasks.spawn(async move {
                run_one(spec, target, semaphore, abort, fail_fast, deadline_at).await
            });
        }

        // Each worker owns its invocation and hands it back exactly once;
        // this collection is the only synchronization point.
        let mut invocations = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let invocation = joined.map_err(|e| OrchestratorError::Worker(e.to_string()))?;
            debug_assert!(invocation.state.is_terminal());
            invocations.push(invocation);
        }

        invocations.sort_by(|a, b| a.scanner.cmp(&b.scanner));
        Ok(invocations)
    }
}

async fn run_one(
    spec: ScannerSpec,
    target: ScanTarget,
    semaphore: Arc<Semaphore>,
    abort: Arc<AtomicBool>,
    fail_fast: bool,
    deadline_at: Option<Instant>,
) -> ScanInvocation {
    let mut invocation = ScanInvocation::new(&spec.name);

    // acquire_owned never fails here: the semaphore lives for the whole run.
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            invocation.cancel();
            return invocation;
        }
    };

    if abort.load(Ordering::SeqCst) {
        debug!(scanner = %spec.name, "cancelled by fail-fast");
        invocation.cancel();
        return invocation;
    }

    // Effective timeout composes the per-scanner budget with what is left
    // of the global deadline.
    let per_scanner = Duration::from_secs(spec.timeout_seconds);
    let timeout = match deadline_at {
        Some(at) => {
            let remaining = at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(scanner = %spec.name, "cancelled by deadline");
                invocation.cancel();
                return invocation;
            }
            per_scanner.min(remaining)
        }
        None => per_scanner,
    };

    let argv: Vec<String> = spec
        .command
        .iter()
        .map(|arg| arg.replace("{target}", &target.root.to_string_lossy()))
        .collect();

    invocation.start();
    match process::run(&argv, &target.root, timeout).await {
        Ok(output) if output.timed_out => {
            // Timeouts are tolerated and never trigger fail-fast.
            invocation.time_out(timeout.as_secs());
        }
        Ok(output) => {
            debug!(
                scanner = %spec.name,
                exit_code = ?output.exit_code,
                stdout_lines = output.stdout.len(),
                "scanner finished"
            );
            invocation.succeed(output.exit_code, output.stdout, output.stderr);
        }
        Err(err @ InvocationError::Spawn { .. }) => {
            warn!(scanner = %spec.name, error = %err, "scanner failed to start");
            if fail_fast {
                abort.store(true, Ordering::SeqCst);
            }
            invocation.fail(err);
        }
        Err(err) => {
            if fail_fast {
                abort.store(true, Ordering::SeqCst);
            }
            invocation.fail(err);
        }
    }
    invocation
}
