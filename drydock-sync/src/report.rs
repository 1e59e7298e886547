//! Per-project run report.
//!
//! The batch pattern is an explicit per-item result collected into a
//! report — errors are data here, not control flow. The CLI renders this;
//! the exit code never reflects per-project failures.

use chrono::{DateTime, Utc};

use drydock_core::types::ProjectName;

use crate::acl::AclOutcome;
use crate::error::SyncError;

/// Outcome of reconciling a single declared project.
#[derive(Debug)]
pub enum ProjectOutcome {
    /// All applicable convergence steps completed.
    Converged {
        /// Whether the server record was created this run.
        created: bool,
        /// Result of the access-control session, when one ran.
        acl: Option<AclOutcome>,
    },
    /// `no-gerrit` — deliberately untouched.
    Skipped,
    /// Processing raised; the batch moved on.
    Failed(SyncError),
}

impl ProjectOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ProjectOutcome::Failed(_))
    }
}

/// One project's entry in the run report.
#[derive(Debug)]
pub struct ProjectReport {
    pub project: ProjectName,
    pub outcome: ProjectOutcome,
}

/// The whole batch, in declaration order.
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub projects: Vec<ProjectReport>,
}

impl RunReport {
    pub fn converged_count(&self) -> usize {
        self.projects
            .iter()
            .filter(|p| matches!(p.outcome, ProjectOutcome::Converged { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.projects
            .iter()
            .filter(|p| matches!(p.outcome, ProjectOutcome::Skipped))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.projects.iter().filter(|p| p.outcome.is_failed()).count()
    }
}
