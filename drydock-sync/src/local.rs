//! Local copy builder and updater.
//!
//! The builder materializes a working copy for a project that has none,
//! choosing between three sources (server, upstream, fresh init); the
//! updater reconciles an existing working copy's remotes and tracking
//! branches. The builder never pushes — it returns the [`PushAction`]
//! (or none) that the engine later executes for newly created projects.

use std::collections::BTreeSet;
use std::path::Path;

use drydock_core::types::{ProjectConfig, ProjectName, RepoLocations, Settings};
use drydock_git::exec::EnvOverlay;
use drydock_git::repo::{self, Repo};

use crate::error::{io_err, SyncError};

/// The publish required to put a freshly built working copy on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushAction {
    /// Refspec handed to `git push <remote_url> <refspec>`.
    pub refspec: String,
}

impl PushAction {
    pub fn new(refspec: impl Into<String>) -> Self {
        PushAction {
            refspec: refspec.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build a working copy for a project that has none (or whose server record
/// was just created). Exactly one branch of the decision tree executes:
///
/// 1. Server knows the project and has a `master` ref — clone from the
///    server; register `upstream` as a second remote without fetching.
///    Nothing to publish.
/// 2. Server lacks the project but an upstream is declared — clone the
///    upstream, hold its branch heads under `refs/copy/heads/*`, rename
///    the clone remote to `upstream`, point `origin` at the server.
///    Publish action: `+refs/copy/heads/*:refs/heads/*`.
/// 3. Neither — init an empty repository, point `origin` at the server,
///    commit the review-binding descriptor. Publish action:
///    `HEAD:refs/heads/master`.
pub fn make_local_copy(
    project: &ProjectConfig,
    loc: &RepoLocations,
    known_projects: &BTreeSet<String>,
    server_refs: &[String],
    settings: &Settings,
    env: &EnvOverlay,
) -> Result<Option<PushAction>, SyncError> {
    if let Some(parent) = loc.work_dir.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let no_env = EnvOverlay::new();
    let server_has_master = known_projects.contains(&project.project.0)
        && server_refs.iter().any(|r| r == "refs/heads/master");

    if server_has_master {
        let out = repo::clone(&loc.remote_url, &loc.work_dir, env)?;
        if !out.success() {
            return Err(SyncError::Command {
                action: format!("clone of '{}'", loc.remote_url),
                status: out.status,
                output: out.output,
            });
        }
        if let Some(upstream) = &project.upstream {
            let repo = Repo::new(&loc.work_dir);
            let status = repo.git(&["remote", "add", "upstream", upstream], &no_env)?;
            if status != 0 {
                tracing::warn!(
                    "failed to register upstream remote for '{}'",
                    project.project
                );
            }
        }
        return Ok(None);
    }

    if let Some(upstream) = &project.upstream {
        // First import: clone the upstream, but ongoing the server is
        // origin and the upstream remote exists only for tracking.
        let out = repo::clone(upstream, &loc.work_dir, env)?;
        if !out.success() {
            return Err(SyncError::Command {
                action: format!("clone of upstream '{upstream}'"),
                status: out.status,
                output: out.output,
            });
        }
        let repo = Repo::new(&loc.work_dir);
        let status = repo.git(&["fetch", "origin", "+refs/heads/*:refs/copy/heads/*"], env)?;
        if status != 0 {
            return Err(SyncError::Command {
                action: format!("holding upstream branch heads for '{}'", project.project),
                status,
                output: String::new(),
            });
        }
        repo.git(&["remote", "rename", "origin", "upstream"], &no_env)?;
        repo.git(&["remote", "add", "origin", &loc.remote_url], &no_env)?;
        return Ok(Some(PushAction::new("+refs/copy/heads/*:refs/heads/*")));
    }

    // Brand new project: nothing on the server, nothing to import.
    let out = repo::init(&loc.work_dir)?;
    if !out.success() {
        return Err(SyncError::Command {
            action: format!("init of '{}'", loc.work_dir.display()),
            status: out.status,
            output: out.output,
        });
    }
    let repo = Repo::new(&loc.work_dir);
    repo.git(&["remote", "add", "origin", &loc.remote_url], &no_env)?;
    write_review_binding(&loc.work_dir, project, settings)?;
    repo.git(&["add", ".gitreview"], &no_env)?;
    let status = commit(&repo, "Added .gitreview", &settings.committer)?;
    if status != 0 {
        return Err(SyncError::Command {
            action: format!("commit of review binding for '{}'", project.project),
            status,
            output: String::new(),
        });
    }
    Ok(Some(PushAction::new("HEAD:refs/heads/master")))
}

/// The descriptor binding a working copy to its review server.
fn write_review_binding(
    work_dir: &Path,
    project: &ProjectConfig,
    settings: &Settings,
) -> Result<(), SyncError> {
    let path = work_dir.join(".gitreview");
    let contents = format!(
        "[gerrit]\nhost={}\nport={}\nproject={}.git\n",
        settings.gerrit_host, settings.gerrit_port, project.project
    );
    std::fs::write(&path, contents).map_err(|e| io_err(&path, e))
}

// ---------------------------------------------------------------------------
// Updater
// ---------------------------------------------------------------------------

/// Reconcile an existing working copy: upstream remote presence/URL,
/// remote refresh, and a local `master` tracking the server's.
///
/// Idempotent — safe to run every reconciliation cycle.
pub fn update_local_copy(
    project: &ProjectConfig,
    loc: &RepoLocations,
    env: &EnvOverlay,
) -> Result<(), SyncError> {
    let repo = Repo::new(&loc.work_dir);
    let no_env = EnvOverlay::new();
    let has_upstream_remote = repo.remotes(&no_env)?.iter().any(|r| r == "upstream");

    if project.track_upstream() {
        let Some(upstream) = &project.upstream else {
            return Err(SyncError::UpstreamMissing {
                project: project.project.clone(),
            });
        };
        if !has_upstream_remote {
            repo.git(&["remote", "add", "upstream", upstream], &no_env)?;
        } else {
            repo.git(&["remote", "set-url", "upstream", upstream], &no_env)?;
        }
        // Refresh everything we might need, pruning branches that no
        // longer exist on any remote.
        repo.git(&["remote", "update", "--prune"], env)?;
    } else if has_upstream_remote {
        repo.git(&["remote", "rm", "upstream"], &no_env)?;
    }

    if repo.has_branch("master", &no_env)? {
        let status = repo.git(&["checkout", "master"], &no_env)?;
        if status != 0 {
            tracing::warn!("failed to check out master for '{}'", project.project);
        }
    } else {
        let status = repo.git(&["checkout", "-b", "master", "origin/master"], &no_env)?;
        if status != 0 {
            tracing::warn!(
                "failed to create master from origin/master for '{}'",
                project.project
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Initial publish
// ---------------------------------------------------------------------------

/// Execute a builder-returned [`PushAction`]: publish the refspec, then all
/// tags, to the server remote.
pub fn push_initial(
    project: &ProjectName,
    action: &PushAction,
    loc: &RepoLocations,
    env: &EnvOverlay,
) -> Result<(), SyncError> {
    let repo = Repo::new(&loc.work_dir);
    let (status, output) = repo.git_output(&["push", &loc.remote_url, &action.refspec], env)?;
    if status != 0 {
        return Err(SyncError::Push {
            project: project.clone(),
            output,
        });
    }
    let (status, output) = repo.git_output(&["push", "--tags", &loc.remote_url], env)?;
    if status != 0 {
        return Err(SyncError::Push {
            project: project.clone(),
            output,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commit identity
// ---------------------------------------------------------------------------

/// Commit with the configured author identity, independent of any global
/// git configuration on the host.
pub(crate) fn commit(repo: &Repo, message: &str, committer: &str) -> Result<i32, SyncError> {
    let (name, email) = split_identity(committer);
    let user_name = format!("user.name={name}");
    let user_email = format!("user.email={email}");
    let author = format!("{name} <{email}>");
    let status = repo.git(
        &[
            "-c",
            &user_name,
            "-c",
            &user_email,
            "commit",
            "-a",
            "-m",
            message,
            "--author",
            &author,
        ],
        &EnvOverlay::new(),
    )?;
    Ok(status)
}

/// Split `Name <email>` into its parts, with a fallback for malformed
/// committer strings.
pub(crate) fn split_identity(committer: &str) -> (String, String) {
    match (committer.find('<'), committer.rfind('>')) {
        (Some(open), Some(close)) if open < close => (
            committer[..open].trim().to_string(),
            committer[open + 1..close].trim().to_string(),
        ),
        _ => (
            committer.trim().to_string(),
            "drydock@localhost".to_string(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
