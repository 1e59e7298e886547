//! Local copy builder and updater tests against real git repositories.

mod common;

use std::collections::BTreeSet;

use tempfile::TempDir;

use common::{
    file_url, git_in, git_status_in, init_bare, make_upstream_repo, seed_master, test_settings,
};
use drydock_core::types::{ProjectConfig, RepoLocations, OPT_TRACK_UPSTREAM};
use drydock_git::exec::EnvOverlay;
use drydock_sync::local::{make_local_copy, push_initial, update_local_copy};

fn no_env() -> EnvOverlay {
    EnvOverlay::new()
}

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            root: TempDir::new().expect("tempdir"),
        }
    }

    fn locations(&self, name: &str) -> RepoLocations {
        RepoLocations {
            remote_url: file_url(&self.root.path().join("server").join(name)),
            work_dir: self.root.path().join("cache").join(name),
            mirror_dir: self.root.path().join("mirrors").join(format!("{name}.git")),
        }
    }

    fn server_repo(&self, name: &str) -> std::path::PathBuf {
        let path = self.root.path().join("server").join(name);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        init_bare(&path);
        path
    }

    fn settings(&self) -> drydock_core::types::Settings {
        test_settings(
            &self.root.path().join("cache"),
            &self.root.path().join("mirrors"),
            None,
        )
    }
}

fn known(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Builder: server-known branch
// ---------------------------------------------------------------------------

#[test]
fn server_known_with_master_clones_and_returns_no_action() {
    let fx = Fixture::new();
    let server = fx.server_repo("nova");
    seed_master(&server, fx.root.path());

    let mut project = ProjectConfig::named("nova");
    // Deliberately unreachable: proves the upstream remote is registered
    // without fetching.
    project.upstream = Some("file:///no/such/upstream".to_string());

    let loc = fx.locations("nova");
    let action = make_local_copy(
        &project,
        &loc,
        &known(&["nova"]),
        &["refs/heads/master".to_string()],
        &fx.settings(),
        &no_env(),
    )
    .expect("build");

    assert!(action.is_none(), "server clones need no publish");
    assert!(loc.work_dir.join("README").exists());

    let remotes = git_in(&loc.work_dir, &["remote"]);
    assert!(remotes.contains("origin"));
    assert!(remotes.contains("upstream"));
    assert_ne!(
        git_status_in(
            &loc.work_dir,
            &["rev-parse", "--verify", "refs/remotes/upstream/master"],
        ),
        0,
        "upstream must be registered without fetching"
    );
}

#[test]
fn known_project_without_master_ref_falls_through_to_import() {
    let fx = Fixture::new();
    fx.server_repo("bare-only");
    let upstream = fx.root.path().join("upstreams").join("bare-only");
    make_upstream_repo(&upstream, &["master"]);

    let mut project = ProjectConfig::named("bare-only");
    project.upstream = Some(file_url(&upstream));

    let loc = fx.locations("bare-only");
    // The server knows the project but has no master ref yet.
    let action = make_local_copy(
        &project,
        &loc,
        &known(&["bare-only"]),
        &[],
        &fx.settings(),
        &no_env(),
    )
    .expect("build");

    assert_eq!(
        action.expect("push action").refspec,
        "+refs/copy/heads/*:refs/heads/*"
    );
}

// ---------------------------------------------------------------------------
// Builder: upstream import branch
// ---------------------------------------------------------------------------

#[test]
fn upstream_import_holds_heads_and_republishes_them() {
    let fx = Fixture::new();
    let server = fx.server_repo("imported");
    let upstream = fx.root.path().join("upstreams").join("imported");
    make_upstream_repo(&upstream, &["master", "feature"]);

    let mut project = ProjectConfig::named("imported");
    project.upstream = Some(file_url(&upstream));

    let loc = fx.locations("imported");
    let action = make_local_copy(
        &project,
        &loc,
        &known(&[]),
        &[],
        &fx.settings(),
        &no_env(),
    )
    .expect("build")
    .expect("push action");

    assert_eq!(action.refspec, "+refs/copy/heads/*:refs/heads/*");

    // Original branch heads are held under the copy namespace.
    git_in(&loc.work_dir, &["rev-parse", "--verify", "refs/copy/heads/master"]);
    git_in(&loc.work_dir, &["rev-parse", "--verify", "refs/copy/heads/feature"]);

    // The clone remote became `upstream`; `origin` points at the server.
    let remotes = git_in(&loc.work_dir, &["remote", "-v"]);
    assert!(remotes.contains(&format!("upstream\t{}", file_url(&upstream))));
    assert!(remotes.contains(&format!("origin\t{}", loc.remote_url)));

    // Executing the action publishes every held head under its original
    // name.
    push_initial(&project.project, &action, &loc, &no_env()).expect("push");
    git_in(&server, &["rev-parse", "--verify", "refs/heads/master"]);
    git_in(&server, &["rev-parse", "--verify", "refs/heads/feature"]);
}

// ---------------------------------------------------------------------------
// Builder: fresh init branch
// ---------------------------------------------------------------------------

#[test]
fn fresh_init_commits_review_binding_and_publishes_master() {
    let fx = Fixture::new();
    let server = fx.server_repo("greenfield");

    let project = ProjectConfig::named("greenfield");
    let loc = fx.locations("greenfield");
    let action = make_local_copy(
        &project,
        &loc,
        &known(&[]),
        &[],
        &fx.settings(),
        &no_env(),
    )
    .expect("build")
    .expect("push action");

    assert_eq!(action.refspec, "HEAD:refs/heads/master");

    let binding =
        std::fs::read_to_string(loc.work_dir.join(".gitreview")).expect("read .gitreview");
    assert_eq!(
        binding,
        "[gerrit]\nhost=review.example.org\nport=29418\nproject=greenfield.git\n"
    );

    // The descriptor is committed under the configured identity.
    assert_eq!(git_in(&loc.work_dir, &["status", "--porcelain"]), "");
    assert_eq!(
        git_in(&loc.work_dir, &["log", "-1", "--format=%s"]),
        "Added .gitreview"
    );
    assert_eq!(
        git_in(&loc.work_dir, &["log", "-1", "--format=%an <%ae>"]),
        common::COMMITTER
    );

    push_initial(&project.project, &action, &loc, &no_env()).expect("push");
    git_in(&server, &["rev-parse", "--verify", "refs/heads/master"]);
}

// ---------------------------------------------------------------------------
// Updater
// ---------------------------------------------------------------------------

fn cloned_work_copy(fx: &Fixture, name: &str) -> RepoLocations {
    let server = fx.server_repo(name);
    seed_master(&server, fx.root.path());
    let loc = fx.locations(name);
    std::fs::create_dir_all(loc.work_dir.parent().expect("parent")).expect("mkdir");
    git_in(
        std::path::Path::new("/"),
        &[
            "clone",
            &loc.remote_url,
            loc.work_dir.to_str().expect("utf8 path"),
        ],
    );
    loc
}

#[test]
fn updater_adds_upstream_remote_and_refreshes_idempotently() {
    let fx = Fixture::new();
    let loc = cloned_work_copy(&fx, "tracked");
    let upstream = fx.root.path().join("upstreams").join("tracked");
    make_upstream_repo(&upstream, &["master"]);

    let mut project = ProjectConfig::named("tracked");
    project.options = vec![OPT_TRACK_UPSTREAM.to_string()];
    project.upstream = Some(file_url(&upstream));

    update_local_copy(&project, &loc, &no_env()).expect("first update");
    let remotes = git_in(&loc.work_dir, &["remote", "-v"]);
    assert!(remotes.contains(&format!("upstream\t{}", file_url(&upstream))));
    // Tracking implies a refresh: the upstream refs are now known locally.
    git_in(
        &loc.work_dir,
        &["rev-parse", "--verify", "refs/remotes/upstream/master"],
    );

    let state_before = common::all_refs(&loc.work_dir);
    update_local_copy(&project, &loc, &no_env()).expect("second update");
    let state_after = common::all_refs(&loc.work_dir);
    assert_eq!(state_before, state_after, "re-running must change nothing");
}

#[test]
fn updater_corrects_a_stale_upstream_url() {
    let fx = Fixture::new();
    let loc = cloned_work_copy(&fx, "moved");
    let old = fx.root.path().join("upstreams").join("old");
    let new = fx.root.path().join("upstreams").join("new");
    make_upstream_repo(&old, &["master"]);
    make_upstream_repo(&new, &["master"]);
    git_in(&loc.work_dir, &["remote", "add", "upstream", &file_url(&old)]);

    let mut project = ProjectConfig::named("moved");
    project.options = vec![OPT_TRACK_UPSTREAM.to_string()];
    project.upstream = Some(file_url(&new));

    update_local_copy(&project, &loc, &no_env()).expect("update");
    let remotes = git_in(&loc.work_dir, &["remote", "-v"]);
    assert!(remotes.contains(&format!("upstream\t{}", file_url(&new))));
    assert!(!remotes.contains(&format!("upstream\t{}", file_url(&old))));
}

#[test]
fn updater_removes_upstream_remote_when_tracking_is_off() {
    let fx = Fixture::new();
    let loc = cloned_work_copy(&fx, "untracked");
    git_in(
        &loc.work_dir,
        &["remote", "add", "upstream", "file:///anywhere"],
    );

    let project = ProjectConfig::named("untracked");
    update_local_copy(&project, &loc, &no_env()).expect("update");

    let remotes = git_in(&loc.work_dir, &["remote"]);
    assert!(!remotes.contains("upstream"));
}

#[test]
fn updater_always_lands_on_master() {
    let fx = Fixture::new();
    let loc = cloned_work_copy(&fx, "wandering");
    git_in(&loc.work_dir, &["checkout", "-b", "elsewhere"]);

    let project = ProjectConfig::named("wandering");
    update_local_copy(&project, &loc, &no_env()).expect("update");

    assert_eq!(
        git_in(&loc.work_dir, &["rev-parse", "--abbrev-ref", "HEAD"]),
        "master"
    );
}
