//! Reconciliation engine — classify each declared project and drive the
//! convergence components in order.
//!
//! Per project: ensure the server record, ensure the bare mirror, build or
//! update the working copy, publish initial content for newly created
//! projects, mirror upstream branches when tracking is declared, then sync
//! access-control policy (or push the declared description). Any error is
//! caught at the project boundary; the batch always continues.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;

use drydock_acl::PolicyRenderer;
use drydock_core::types::{Layout, ProjectConfig, Settings};
use drydock_gerrit::GerritClient;
use drydock_git::exec::EnvOverlay;

use crate::acl::{self, AclOutcome};
use crate::error::SyncError;
use crate::local;
use crate::mirror;
use crate::report::{ProjectOutcome, ProjectReport, RunReport};
use crate::retry::{thread_sleep, RetryPolicy};
use crate::upstream;

/// One run's reconciliation context: immutable settings, derived layout,
/// the server client, and the pre-batch server project snapshot.
pub struct Reconciler<'a> {
    settings: &'a Settings,
    layout: Layout,
    gerrit: &'a dyn GerritClient,
    renderer: PolicyRenderer,
    known_projects: BTreeSet<String>,
    ssh_env: EnvOverlay,
    retry: RetryPolicy,
    sleep: fn(Duration),
}

impl<'a> Reconciler<'a> {
    /// Build a reconciler. `known_projects` is the server snapshot taken
    /// once before the batch; it is never updated mid-run, so a project
    /// created during the run still classifies as server-unknown — which
    /// is what routes its initial content onto the server.
    pub fn new(
        settings: &'a Settings,
        layout: Layout,
        gerrit: &'a dyn GerritClient,
        known_projects: BTreeSet<String>,
        ssh_env: EnvOverlay,
    ) -> Result<Self, SyncError> {
        let renderer = match &settings.acl_dir {
            Some(dir) => PolicyRenderer::from_dir(dir)?,
            None => PolicyRenderer::empty(),
        };
        Ok(Reconciler {
            settings,
            layout,
            gerrit,
            renderer,
            known_projects,
            ssh_env,
            retry: RetryPolicy::default(),
            sleep: thread_sleep,
        })
    }

    /// Override the server-polling retry budget (tests use a zero delay).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Process every project, in order. A failure in one project is
    /// recorded and logged; the next project is processed regardless.
    pub fn run(&self, projects: &[&ProjectConfig]) -> RunReport {
        let started_at = Utc::now();
        let mut reports = Vec::new();
        for project in projects {
            let name = project.name().clone();
            let outcome = if project.review_disabled() {
                tracing::debug!("'{name}' opts out of review; skipping");
                ProjectOutcome::Skipped
            } else {
                match self.process(project) {
                    Ok((created, acl)) => ProjectOutcome::Converged { created, acl },
                    Err(err) => {
                        tracing::error!("problems converging '{name}', moving on: {err}");
                        ProjectOutcome::Failed(err)
                    }
                }
            };
            reports.push(ProjectReport {
                project: name,
                outcome,
            });
        }
        RunReport {
            started_at,
            finished_at: Utc::now(),
            projects: reports,
        }
    }

    fn process(&self, project: &ProjectConfig) -> Result<(bool, Option<AclOutcome>), SyncError> {
        let name = &project.project;

        // Configuration invariant, checked before any side effect.
        if project.track_upstream() && project.upstream.is_none() {
            return Err(SyncError::UpstreamMissing {
                project: name.clone(),
            });
        }

        let loc = self.layout.locations(name);

        // Server record first: creating it after the replica exists on
        // disk fails on the server side.
        let created = if !self.known_projects.contains(&name.0) {
            self.gerrit.create_project(&name.0)?;
            true
        } else {
            false
        };

        let owner = match (&self.settings.system_user, &self.settings.system_group) {
            (Some(user), Some(group)) => Some((user.as_str(), group.as_str())),
            _ => None,
        };
        mirror::create_local_mirror(&loc.mirror_dir, owner)?;

        let push_action = if !loc.work_dir.exists() || created {
            let server_refs = if self.known_projects.contains(&name.0) {
                self.gerrit.list_refs(&name.0)?
            } else {
                Vec::new()
            };
            local::make_local_copy(
                project,
                &loc,
                &self.known_projects,
                &server_refs,
                self.settings,
                &self.ssh_env,
            )?
        } else {
            local::update_local_copy(project, &loc, &self.ssh_env)?;
            None
        };

        if created {
            if let Some(action) = &push_action {
                local::push_initial(name, action, &loc, &self.ssh_env)?;
            }
            self.gerrit.replicate(&name.0)?;
        }

        if project.track_upstream() {
            upstream::sync_upstream(project, &loc, &self.ssh_env)?;
        }

        let template = project.acl_file_name();
        let acl_outcome = if self.renderer.has_template(&template) {
            let mut sleep = self.sleep;
            Some(acl::sync_project_acls(
                project,
                &loc,
                &self.renderer,
                self.gerrit,
                &self.settings.committer,
                &self.retry,
                &mut sleep,
                &self.ssh_env,
            )?)
        } else {
            if let Some(description) = &project.description {
                self.gerrit.set_description(&name.0, description)?;
            }
            None
        };

        Ok((created, acl_outcome))
    }
}
