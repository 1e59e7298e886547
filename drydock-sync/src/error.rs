//! Error types for drydock-sync.
//!
//! Shell commands that exit non-zero are surfaced as status codes and
//! checked explicitly; the named failure kinds below are raised as errors
//! and caught at the single per-project boundary in [`crate::engine`].

use std::path::PathBuf;

use thiserror::Error;

use drydock_acl::AclError;
use drydock_core::types::ProjectName;
use drydock_gerrit::GerritError;
use drydock_git::ExecError;

/// All errors that can arise from project reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A subprocess could not be spawned at all.
    #[error("exec error: {0}")]
    Exec(#[from] ExecError),

    /// An error from the review-server client.
    #[error("server error: {0}")]
    Gerrit(#[from] GerritError),

    /// An error from the policy rendering engine.
    #[error("render error: {0}")]
    Render(#[from] AclError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required shell step exited non-zero.
    #[error("{action} failed with status {status}: {output}")]
    Command {
        action: String,
        status: i32,
        output: String,
    },

    /// Bare mirror initialization failed; the partial directory was removed.
    #[error("failed to initialize mirror at {path}: {output}")]
    MirrorInit { path: PathBuf, output: String },

    /// `track-upstream` declared without an upstream URL.
    #[error("project '{project}' declares track-upstream but no upstream URL")]
    UpstreamMissing { project: ProjectName },

    /// The server's policy metadata ref stayed unreachable for the whole
    /// retry budget.
    #[error("failed to fetch refs/meta/config for project '{project}'")]
    Fetch { project: ProjectName },

    /// The declared policy template does not exist on disk.
    #[error("policy template '{template}' is missing")]
    PolicyCopy { template: String },

    /// The server could not produce a usable identifier for a group.
    #[error("unable to resolve a server identifier for group '{group}'")]
    GroupCreation { group: String },

    /// The remote rejected a publish of initial content.
    #[error("failed to push '{project}': {output}")]
    Push { project: ProjectName, output: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
