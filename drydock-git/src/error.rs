//! Error types for drydock-git.

use thiserror::Error;

/// All errors that can arise from shell execution.
///
/// A command that runs and exits non-zero is NOT an error here — the exit
/// status is surfaced to the caller, who checks it explicitly.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command could not be spawned at all (binary missing, not
    /// executable, ...).
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while preparing execution (e.g. writing the SSH wrapper).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
