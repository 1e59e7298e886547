//! Error types for drydock-acl.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from policy template rendering.
#[derive(Debug, Error)]
pub enum AclError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// No template with this name exists in the policy directory.
    #[error("no policy template named '{name}'")]
    TemplateMissing { name: String },

    /// Filesystem error while loading templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
