//! Error types for drydock-gerrit.

use thiserror::Error;

use drydock_git::ExecError;

/// All errors that can arise from review-server interaction.
#[derive(Debug, Error)]
pub enum GerritError {
    /// The underlying ssh/git process could not run.
    #[error("exec error: {0}")]
    Exec(#[from] ExecError),

    /// The server rejected a command (non-zero exit status).
    #[error("server command '{command}' failed with status {status}: {output}")]
    Command {
        command: String,
        status: i32,
        output: String,
    },
}
