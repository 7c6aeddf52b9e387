//! External process execution with timeout enforcement.
//!
//! Runs one scanner command, captures stdout/stderr line by line, and kills
//! the child if it outlives its timeout. A non-zero exit code is never an
//! error here: most scanners exit non-zero to mean "findings present". Only
//! a failure to spawn at all (missing binary, permission denied) is
//! surfaced as [`InvocationError::Spawn`].

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::InvocationError;

/// Captured result of one scanner process.
#[derive(Debug)]
pub struct ProcessOutput {
    /// `None` when the process was killed (timeout) or terminated by a
    /// signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub timed_out: bool,
}

/// Run `argv` in `workdir`, killing it after `timeout`.
///
/// Output capture is unbounded; scanner output is bounded by codebase size
/// in this domain. The only error is a spawn-level failure.
pub async fn run(
    argv: &[String],
    workdir: &Path,
    timeout: Duration,
) -> Result<ProcessOutput, InvocationError> {
    // Empty argv is rejected at config load; guard anyway so a bad caller
    // gets a spawn error instead of a panic.
    let Some((program, args)) = argv.split_first() else {
        return Err(InvocationError::Spawn {
            command: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    debug!(command = %argv.join(" "), workdir = %workdir.display(), "spawning scanner");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| InvocationError::Spawn {
            command: argv.join(" "),
            source: e,
        })?;

    // Drain both pipes concurrently with the wait so a chatty scanner can
    // never fill a pipe buffer and deadlock against us.
    let stdout_task = tokio::spawn(read_lines(child.stdout.take()));
    let stderr_task = tokio::spawn(read_lines(child.stderr.take()));

    let (status, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => (Some(status), false),
        Ok(Err(e)) => {
            // wait() failing after a successful spawn is an OS-level oddity;
            // treat it like a kill.
            warn!(error = %e, "waiting on scanner process failed");
            (None, false)
        }
        Err(_elapsed) => {
            warn!(timeout_secs = timeout.as_secs(), "scanner timed out, killing");
            // start_kill signals the child; wait() reaps it so the pipes
            // close and the reader tasks finish.
            if let Err(e) = child.start_kill() {
                warn!(error = %e, "failed to kill timed-out scanner");
            }
            let _ = child.wait().await;
            (None, true)
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(ProcessOutput {
        exit_code: status.and_then(|s| s.code()),
        stdout,
        stderr,
        timed_out,
    })
}

async fn read_lines<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<String> {
    let Some(pipe) = pipe else {
        return Vec::new();
    };
    let mut lines = BufReader::new(pipe).lines();
    let mut collected = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        collected.push(line);
    }
    collected
}
