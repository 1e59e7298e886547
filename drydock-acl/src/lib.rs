//! # drydock-acl
//!
//! Access-control policy template rendering. Templates are plain files in
//! the site's policy directory, rendered against project attributes into
//! the `project.config` text pushed to the server's metadata ref.

pub mod context;
pub mod engine;
pub mod error;

pub use context::AclContext;
pub use engine::PolicyRenderer;
pub use error::AclError;
