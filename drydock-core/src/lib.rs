//! Drydock core library — declared configuration, location derivation, errors.
//!
//! Public API surface:
//! - [`types`] — project descriptors, site settings, repository locations
//! - [`error`] — [`ConfigError`]
//! - [`registry`] — settings / project-list loading

pub mod error;
pub mod registry;
pub mod types;

pub use error::ConfigError;
pub use registry::ProjectRegistry;
pub use types::{Layout, ProjectConfig, ProjectName, RepoLocations, Settings};
