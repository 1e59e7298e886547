//! Version-control adapter — git subcommands against a fixed repository path.

use std::path::{Path, PathBuf};

use crate::error::ExecError;
use crate::exec::{run, EnvOverlay, ExecOutput};

/// A working copy (or bare repository) on disk.
///
/// Every subcommand runs as `git -C <path> ...`; the path is fixed at
/// construction so call sites read like the git invocations they issue.
#[derive(Debug, Clone)]
pub struct Repo {
    path: PathBuf,
}

impl Repo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Repo { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a git subcommand, returning only the exit status.
    pub fn git(&self, args: &[&str], env: &EnvOverlay) -> Result<i32, ExecError> {
        Ok(self.git_output(args, env)?.0)
    }

    /// Run a git subcommand, returning exit status and combined output.
    pub fn git_output(&self, args: &[&str], env: &EnvOverlay) -> Result<(i32, String), ExecError> {
        let path = self.path.to_string_lossy();
        let mut full: Vec<&str> = vec!["-C", path.as_ref()];
        full.extend_from_slice(args);
        let out = run("git", &full, env)?;
        Ok((out.status, out.output))
    }

    /// True iff `refs/heads/<branch>` exists locally.
    pub fn has_branch(&self, branch: &str, env: &EnvOverlay) -> Result<bool, ExecError> {
        let refname = format!("refs/heads/{branch}");
        let status = self.git(&["show-ref", "--verify", "--quiet", &refname], env)?;
        Ok(status == 0)
    }

    /// Names of configured remotes.
    pub fn remotes(&self, env: &EnvOverlay) -> Result<Vec<String>, ExecError> {
        let (_, out) = self.git_output(&["remote"], env)?;
        Ok(out.lines().map(|l| l.trim().to_string()).collect())
    }
}

/// `git clone <url> <dest>` — used before a [`Repo`] exists.
pub fn clone(url: &str, dest: &Path, env: &EnvOverlay) -> Result<ExecOutput, ExecError> {
    let dest = dest.to_string_lossy();
    run("git", &["clone", url, dest.as_ref()], env)
}

/// `git init <dest>`
pub fn init(dest: &Path) -> Result<ExecOutput, ExecError> {
    let dest = dest.to_string_lossy();
    run("git", &["init", dest.as_ref()], &EnvOverlay::new())
}

/// `git init --bare <dest>`
pub fn init_bare(dest: &Path) -> Result<ExecOutput, ExecError> {
    let dest = dest.to_string_lossy();
    run("git", &["init", "--bare", dest.as_ref()], &EnvOverlay::new())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
