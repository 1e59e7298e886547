//! Access-control sync engine.
//!
//! Per-project session against the server's `refs/meta/config` ref:
//! fetch (with polling — a freshly created project materializes the ref
//! only after some delay), locate the policy file, check out a session
//! branch, render and diff the declared policy, resolve group identifiers,
//! commit and push. The working copy is restored unconditionally at the
//! end, whatever happened in between.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use similar::TextDiff;

use drydock_acl::{AclContext, AclError, PolicyRenderer};
use drydock_core::types::{ProjectConfig, RepoLocations};
use drydock_gerrit::GerritClient;
use drydock_git::exec::EnvOverlay;
use drydock_git::repo::Repo;

use crate::error::{io_err, SyncError};
use crate::local::commit;
use crate::retry::RetryPolicy;

/// Local tracking ref for the server's policy metadata.
const META_TRACKING_REF: &str = "remotes/gerrit-meta/config";
/// Session branch name; created at most once per working copy per session.
const SESSION_BRANCH: &str = "config";
/// The policy file, as the server names it.
const POLICY_FILE: &str = "project.config";

/// Terminal state of one access-control session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclOutcome {
    /// The rendered policy differed and was committed and pushed.
    Applied,
    /// The rendered policy was byte-identical to the server's; nothing to
    /// commit or push.
    Unchanged,
    /// Commit or push was rejected; the server keeps its prior state.
    Failed { reason: String },
}

/// Run one access-control session for a project.
///
/// Fetch-failure, policy-copy-failure, and group-creation-failure raise;
/// commit/push rejection ends the session as [`AclOutcome::Failed`]
/// without raising. Cleanup runs in every case.
#[allow(clippy::too_many_arguments)]
pub fn sync_project_acls(
    project: &ProjectConfig,
    loc: &RepoLocations,
    renderer: &PolicyRenderer,
    gerrit: &dyn GerritClient,
    committer: &str,
    retry: &RetryPolicy,
    sleep: &mut dyn FnMut(Duration),
    env: &EnvOverlay,
) -> Result<AclOutcome, SyncError> {
    let repo = Repo::new(&loc.work_dir);
    let result = run_session(
        project, loc, &repo, renderer, gerrit, committer, retry, sleep, env,
    );
    teardown(&repo, project);
    result
}

#[allow(clippy::too_many_arguments)]
fn run_session(
    project: &ProjectConfig,
    loc: &RepoLocations,
    repo: &Repo,
    renderer: &PolicyRenderer,
    gerrit: &dyn GerritClient,
    committer: &str,
    retry: &RetryPolicy,
    sleep: &mut dyn FnMut(Duration),
    env: &EnvOverlay,
) -> Result<AclOutcome, SyncError> {
    let no_env = EnvOverlay::new();
    let name = &project.project;

    // Poll for refs/meta/config: the server may not have written it yet
    // for a freshly created project.
    let refspec = format!("+refs/meta/config:refs/{META_TRACKING_REF}");
    let fetched = retry.run(sleep, |attempt| -> Result<(), SyncError> {
        let status = repo.git(&["fetch", &loc.remote_url, &refspec], env)?;
        if status == 0 {
            Ok(())
        } else {
            tracing::debug!("attempt {attempt}: refs/meta/config not yet fetchable for '{name}'");
            Err(SyncError::Fetch {
                project: name.clone(),
            })
        }
    });
    if let Err(err) = fetched {
        tracing::error!("failed to fetch refs/meta/config for project '{name}'");
        return Err(err);
    }

    // Poll for the policy file: the server may not have committed an empty
    // one yet.
    let with_tree = format!("--with-tree={META_TRACKING_REF}");
    let located = retry.run(sleep, |attempt| -> Result<(), SyncError> {
        let status = repo.git(&["remote", "update", "--prune"], env)?;
        if status != 0 {
            tracing::error!("failed to update remotes for '{name}'");
            return Err(SyncError::Fetch {
                project: name.clone(),
            });
        }
        let (status, output) = repo.git_output(&["ls-files", &with_tree, POLICY_FILE], &no_env)?;
        if status == 0 && output.trim() == POLICY_FILE {
            Ok(())
        } else {
            tracing::debug!("attempt {attempt}: {POLICY_FILE} not yet present for '{name}'");
            Err(SyncError::Fetch {
                project: name.clone(),
            })
        }
    });
    if let Err(err) = located {
        tracing::error!("failed to find {POLICY_FILE} for project '{name}'");
        return Err(err);
    }

    // The session branch can only be created once per working copy; this
    // step is deliberately not retried.
    let status = repo.git(&["checkout", "-b", SESSION_BRANCH, META_TRACKING_REF], &no_env)?;
    if status != 0 {
        tracing::error!("failed to check out the policy branch for '{name}'");
        return Err(SyncError::Fetch {
            project: name.clone(),
        });
    }

    // Render the declared template over the server's policy file.
    let template = project.acl_file_name();
    let rendered = match renderer.render(&template, &AclContext::from_project(project)) {
        Ok(text) => text,
        Err(AclError::TemplateMissing { name }) => {
            return Err(SyncError::PolicyCopy { template: name })
        }
        Err(other) => return Err(SyncError::Render(other)),
    };
    let policy_path = loc.work_dir.join(POLICY_FILE);
    let previous = std::fs::read_to_string(&policy_path).unwrap_or_default();
    std::fs::write(&policy_path, &rendered).map_err(|e| io_err(&policy_path, e))?;

    let status = repo.git(&["diff", "--quiet"], &no_env)?;
    if status == 0 {
        return Ok(AclOutcome::Unchanged);
    }
    let diff = TextDiff::from_lines(&previous, &rendered)
        .unified_diff()
        .header("a/project.config", "b/project.config")
        .to_string();
    tracing::debug!("policy change for '{name}':\n{diff}");

    // Every referenced group needs a server identifier before the policy
    // can land.
    let groups = resolve_groups(&rendered, gerrit)?;
    if !groups.is_empty() {
        let groups_path = loc.work_dir.join("groups");
        let mut contents = String::new();
        for (group, uuid) in &groups {
            contents.push_str(uuid);
            contents.push('\t');
            contents.push_str(group);
            contents.push('\n');
        }
        std::fs::write(&groups_path, contents).map_err(|e| io_err(&groups_path, e))?;
        let status = repo.git(&["add", "groups"], &no_env)?;
        if status != 0 {
            return Err(SyncError::Command {
                action: format!("staging the groups file for '{name}'"),
                status,
                output: String::new(),
            });
        }
    }

    let status = commit(repo, "Update project config.", committer)?;
    if status != 0 {
        tracing::error!("failed to commit policy for project '{name}'");
        return Ok(AclOutcome::Failed {
            reason: "policy commit failed".to_string(),
        });
    }
    let (status, output) =
        repo.git_output(&["push", &loc.remote_url, "HEAD:refs/meta/config"], env)?;
    if status != 0 {
        tracing::error!("failed to push policy for project '{name}': {output}");
        return Ok(AclOutcome::Failed {
            reason: format!("policy push rejected: {output}"),
        });
    }
    Ok(AclOutcome::Applied)
}

/// Restore the working copy: discard uncommitted changes, return to the
/// main branch, drop the session branch. Runs whether the session
/// succeeded or failed; cleanup problems are only worth a debug line.
fn teardown(repo: &Repo, project: &ProjectConfig) {
    let no_env = EnvOverlay::new();
    let steps: [&[&str]; 3] = [
        &["reset", "--hard"],
        &["checkout", "master"],
        &["branch", "-D", SESSION_BRANCH],
    ];
    for args in steps {
        match repo.git(args, &no_env) {
            Ok(0) => {}
            Ok(status) => tracing::debug!(
                "cleanup step {args:?} exited {status} for '{}'",
                project.project
            ),
            Err(err) => tracing::debug!(
                "cleanup step {args:?} failed for '{}': {err}",
                project.project
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Group resolution
// ---------------------------------------------------------------------------

fn group_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\sgroup\s+(.*)$").expect("hard-coded pattern compiles"))
}

/// Scan the policy text for `group <name>` references and resolve each
/// unique name to its server identifier, creating groups on demand.
/// Resolution order follows first appearance in the policy.
fn resolve_groups(
    policy: &str,
    gerrit: &dyn GerritClient,
) -> Result<Vec<(String, String)>, SyncError> {
    let mut resolved: Vec<(String, String)> = Vec::new();
    for line in policy.lines() {
        let Some(caps) = group_pattern().captures(line) else {
            continue;
        };
        let Some(m) = caps.get(1) else {
            continue;
        };
        let group = m.as_str().trim();
        if group.is_empty() || resolved.iter().any(|(g, _)| g == group) {
            continue;
        }
        let uuid = group_uuid_or_create(gerrit, group)?;
        resolved.push((group.to_string(), uuid));
    }
    Ok(resolved)
}

fn group_uuid_or_create(gerrit: &dyn GerritClient, group: &str) -> Result<String, SyncError> {
    if let Some(uuid) = gerrit.group_uuid(group)? {
        return Ok(uuid);
    }
    if let Err(err) = gerrit.create_group(group) {
        tracing::error!("server rejected creation of group '{group}': {err}");
        return Err(SyncError::GroupCreation {
            group: group.to_string(),
        });
    }
    match gerrit.group_uuid(group)? {
        Some(uuid) => Ok(uuid),
        None => {
            tracing::error!("unable to get an identifier for group '{group}'");
            Err(SyncError::GroupCreation {
                group: group.to_string(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
