//! Upstream sync engine — mirror upstream branches into local namespaced
//! branches and republish everything to the review server.

use drydock_core::types::{ProjectConfig, RepoLocations};
use drydock_git::exec::EnvOverlay;
use drydock_git::repo::Repo;

use crate::error::SyncError;

const UPSTREAM_NS: &str = "remotes/upstream/";

/// Fetch-and-prune the `upstream` remote, create a local tracking branch
/// for every upstream branch (optionally prefixed), then push all local
/// branch heads and tags to identically-named server refs.
///
/// The final publish is best-effort: failures are logged with project
/// context and never propagate.
pub fn sync_upstream(
    project: &ProjectConfig,
    loc: &RepoLocations,
    env: &EnvOverlay,
) -> Result<(), SyncError> {
    let repo = Repo::new(&loc.work_dir);
    let no_env = EnvOverlay::new();

    let status = repo.git(&["remote", "update", "upstream", "--prune"], env)?;
    if status != 0 {
        tracing::warn!("failed to refresh upstream remote for '{}'", project.project);
    }

    let (_, listing) = repo.git_output(&["branch", "-a"], &no_env)?;
    for entry in listing.lines() {
        let entry = entry.trim();
        if !entry.starts_with(UPSTREAM_NS) {
            continue;
        }
        // Symbolic alias entries ("remotes/upstream/HEAD -> ...") are not
        // branches.
        if entry.contains("->") {
            continue;
        }
        let Some(remote_branch) = entry.split_whitespace().next() else {
            continue;
        };
        let short = &remote_branch[UPSTREAM_NS.len()..];
        let local_branch = match &project.upstream_prefix {
            Some(prefix) => format!("{prefix}/{short}"),
            None => short.to_string(),
        };

        if !repo.has_branch(&local_branch, &no_env)? {
            let status = repo.git(&["checkout", "-b", &local_branch, remote_branch], &no_env)?;
            if status != 0 {
                tracing::warn!(
                    "failed to create local branch '{local_branch}' for '{}'",
                    project.project
                );
            }
        }
    }

    // Push all local branches to similarly named branches on the server,
    // and push all tags.
    let (status, output) = repo.git_output(&["push", "origin", "refs/heads/*:refs/heads/*"], env)?;
    if status != 0 {
        tracing::error!(
            "error pushing branches of '{}' to the server: {output}",
            project.project
        );
    }
    let (status, output) = repo.git_output(&["push", "origin", "--tags"], env)?;
    if status != 0 {
        tracing::error!(
            "error pushing tags of '{}' to the server: {output}",
            project.project
        );
    }
    Ok(())
}
