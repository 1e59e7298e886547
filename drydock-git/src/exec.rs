//! Shell executor — blocking subprocess runs with combined output capture.

use std::collections::HashMap;
use std::process::Command;

use crate::error::ExecError;

/// Environment variables layered on top of the parent environment.
pub type EnvOverlay = HashMap<String, String>;

/// Exit status and captured output of one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Process exit code; `-1` when the process was killed by a signal.
    pub status: i32,
    /// stdout and stderr, combined, trailing whitespace trimmed.
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Run `program` with `args`, merging `env` over the parent environment.
///
/// Blocks until the process exits. A non-zero exit is reported through
/// [`ExecOutput::status`], never as an `Err` — callers check the status
/// explicitly.
pub fn run(program: &str, args: &[&str], env: &EnvOverlay) -> Result<ExecOutput, ExecError> {
    log::debug!("executing: {} {}", program, args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, value) in env {
        cmd.env(key, value);
    }

    let out = cmd.output().map_err(|e| ExecError::Spawn {
        program: program.to_string(),
        source: e,
    })?;

    let status = out.status.code().unwrap_or(-1);
    let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&out.stderr));
    let combined = combined.trim_end().to_string();

    log::info!("return code: {status}");
    log::info!("command said: {combined}");

    Ok(ExecOutput {
        status,
        output: combined,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
