//! Shared test support: a recording fake review server and git fixtures.
//!
//! The fixtures drive real `git` against `file://` remotes so the
//! convergence engines are exercised end to end without a live server.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Command;

use drydock_core::types::{Layout, Settings};
use drydock_gerrit::{GerritClient, GerritError};

pub const COMMITTER: &str = "Project Creator <infra@example.org>";

// ---------------------------------------------------------------------------
// Fake review server
// ---------------------------------------------------------------------------

/// Records every call; optionally materializes created projects as real
/// bare repositories under `server_root` so pushes against them work.
#[derive(Default)]
pub struct FakeGerrit {
    pub calls: RefCell<Vec<String>>,
    pub projects: RefCell<BTreeSet<String>>,
    pub refs: RefCell<BTreeMap<String, Vec<String>>>,
    pub groups: RefCell<BTreeMap<String, String>>,
    pub fail_create: RefCell<BTreeSet<String>>,
    pub server_root: Option<PathBuf>,
    next_uuid: RefCell<u32>,
}

impl FakeGerrit {
    pub fn new() -> Self {
        FakeGerrit::default()
    }

    /// Created projects become real bare repositories under `root`.
    pub fn with_server_root(root: &Path) -> Self {
        FakeGerrit {
            server_root: Some(root.to_path_buf()),
            ..FakeGerrit::default()
        }
    }

    pub fn add_group(&self, name: &str, uuid: &str) {
        self.groups
            .borrow_mut()
            .insert(name.to_string(), uuid.to_string());
    }

    pub fn calls_named(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl GerritClient for FakeGerrit {
    fn list_projects(&self) -> Result<Vec<String>, GerritError> {
        self.record("list-projects".to_string());
        Ok(self.projects.borrow().iter().cloned().collect())
    }

    fn list_refs(&self, project: &str) -> Result<Vec<String>, GerritError> {
        self.record(format!("list-refs {project}"));
        Ok(self
            .refs
            .borrow()
            .get(project)
            .cloned()
            .unwrap_or_default())
    }

    fn create_project(&self, name: &str) -> Result<(), GerritError> {
        self.record(format!("create-project {name}"));
        if self.fail_create.borrow().contains(name) {
            return Err(GerritError::Command {
                command: format!("gerrit create-project {name}"),
                status: 1,
                output: "project exists or is invalid".to_string(),
            });
        }
        if let Some(root) = &self.server_root {
            init_bare(&root.join(name));
        }
        self.projects.borrow_mut().insert(name.to_string());
        Ok(())
    }

    fn set_description(&self, name: &str, description: &str) -> Result<(), GerritError> {
        self.record(format!("set-description {name}: {description}"));
        Ok(())
    }

    fn group_uuid(&self, name: &str) -> Result<Option<String>, GerritError> {
        self.record(format!("group-uuid {name}"));
        Ok(self.groups.borrow().get(name).cloned())
    }

    fn create_group(&self, name: &str) -> Result<(), GerritError> {
        self.record(format!("create-group {name}"));
        let mut next = self.next_uuid.borrow_mut();
        *next += 1;
        self.groups
            .borrow_mut()
            .insert(name.to_string(), format!("uuid-{next:04}"));
        Ok(())
    }

    fn replicate(&self, name: &str) -> Result<(), GerritError> {
        self.record(format!("replicate {name}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Git fixtures
// ---------------------------------------------------------------------------

/// Run git in `dir`, asserting success.
pub fn git_in(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} in {} failed: {}{}",
        dir.display(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Run git in `dir`, returning the exit status without asserting.
pub fn git_status_in(dir: &Path, args: &[&str]) -> i32 {
    Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("spawn git")
        .status
        .code()
        .unwrap_or(-1)
}

pub fn init_bare(path: &Path) {
    let output = Command::new("git")
        .args(["init", "--bare"])
        .arg(path)
        .output()
        .expect("spawn git");
    assert!(output.status.success(), "git init --bare failed");
    // Pin HEAD so clones check out `master` regardless of the host's
    // init.defaultBranch.
    git_in(path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
}

fn commit_all(dir: &Path, message: &str) {
    git_in(dir, &["add", "-A"]);
    git_in(
        dir,
        &[
            "-c",
            "user.name=Fixture",
            "-c",
            "user.email=fixture@example.org",
            "commit",
            "-m",
            message,
        ],
    );
}

/// Give a bare repository a `master` branch with one file.
pub fn seed_master(bare: &Path, scratch_root: &Path) {
    let scratch = scratch_root.join("seed-master");
    std::fs::create_dir_all(&scratch).expect("mkdir");
    git_in(Path::new("/"), &["init", scratch.to_str().expect("utf8 path")]);
    std::fs::write(scratch.join("README"), "seeded\n").expect("write");
    commit_all(&scratch, "initial");
    git_in(
        &scratch,
        &["push", bare.to_str().expect("utf8 path"), "HEAD:refs/heads/master"],
    );
    std::fs::remove_dir_all(&scratch).expect("cleanup");
}

/// Give a bare repository a `refs/meta/config` ref holding `project.config`.
pub fn seed_meta_config(bare: &Path, scratch_root: &Path, policy: &str) {
    let scratch = scratch_root.join("seed-meta");
    std::fs::create_dir_all(&scratch).expect("mkdir");
    git_in(Path::new("/"), &["init", scratch.to_str().expect("utf8 path")]);
    std::fs::write(scratch.join("project.config"), policy).expect("write");
    commit_all(&scratch, "server policy");
    git_in(
        &scratch,
        &["push", bare.to_str().expect("utf8 path"), "HEAD:refs/meta/config"],
    );
    std::fs::remove_dir_all(&scratch).expect("cleanup");
}

/// A local repository with the given branches (first one seeded with a file).
pub fn make_upstream_repo(path: &Path, branches: &[&str]) {
    std::fs::create_dir_all(path).expect("mkdir");
    git_in(Path::new("/"), &["init", path.to_str().expect("utf8 path")]);
    std::fs::write(path.join("source.txt"), "upstream content\n").expect("write");
    commit_all(path, "upstream initial");
    let first = branches.first().expect("at least one branch");
    git_in(path, &["branch", "-M", first]);
    for branch in &branches[1..] {
        git_in(path, &["branch", branch]);
    }
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Every ref in a repository, `<sha> <name>` per line — for before/after
/// state comparisons.
pub fn all_refs(dir: &Path) -> String {
    git_in(dir, &["for-each-ref"])
}

// ---------------------------------------------------------------------------
// Settings / layout
// ---------------------------------------------------------------------------

pub fn test_settings(cache: &Path, mirrors: &Path, acl_dir: Option<PathBuf>) -> Settings {
    Settings {
        gerrit_host: "review.example.org".to_string(),
        gerrit_port: 29418,
        gerrit_user: "gerrit2".to_string(),
        gerrit_key: PathBuf::from("/dev/null"),
        committer: COMMITTER.to_string(),
        local_git_dir: mirrors.to_path_buf(),
        cache_dir: cache.to_path_buf(),
        acl_dir,
        system_user: None,
        system_group: None,
    }
}

pub fn test_layout(server_root: &Path, cache: &Path, mirrors: &Path) -> Layout {
    Layout {
        remote_base: file_url(server_root),
        cache_dir: cache.to_path_buf(),
        mirror_root: mirrors.to_path_buf(),
    }
}
