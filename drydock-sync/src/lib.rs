//! # drydock-sync
//!
//! The reconciliation engine and its convergence sub-engines.
//!
//! Call [`Reconciler::run`] to process a batch of declared projects:
//! each project is classified against the review server, the local mirror
//! pool, and its declared configuration, then converged through the
//! mirror provisioner, local copy builder/updater, upstream sync, and
//! access-control sync. A failure in one project never aborts the batch.

pub mod acl;
pub mod engine;
pub mod error;
pub mod local;
pub mod mirror;
pub mod report;
pub mod retry;
pub mod upstream;

pub use acl::AclOutcome;
pub use engine::Reconciler;
pub use error::SyncError;
pub use local::PushAction;
pub use report::{ProjectOutcome, ProjectReport, RunReport};
pub use retry::RetryPolicy;
