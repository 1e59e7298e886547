//! [`GerritClient`] trait and the SSH-backed production implementation.

use std::path::PathBuf;

use drydock_git::exec::{run, EnvOverlay};

use crate::error::GerritError;

/// The narrow server interface the reconciliation engine depends on.
///
/// Implementations must not make convergence decisions; they only move
/// bytes to and from the server.
pub trait GerritClient {
    /// Names of every project the server knows about.
    fn list_projects(&self) -> Result<Vec<String>, GerritError>;

    /// Ref names (e.g. `refs/heads/master`) for one project.
    fn list_refs(&self, project: &str) -> Result<Vec<String>, GerritError>;

    fn create_project(&self, name: &str) -> Result<(), GerritError>;

    fn set_description(&self, name: &str, description: &str) -> Result<(), GerritError>;

    /// Server identifier for a group, if the group exists.
    fn group_uuid(&self, name: &str) -> Result<Option<String>, GerritError>;

    fn create_group(&self, name: &str) -> Result<(), GerritError>;

    /// Trigger server-side replication for one project.
    fn replicate(&self, name: &str) -> Result<(), GerritError>;
}

// ---------------------------------------------------------------------------
// SSH implementation
// ---------------------------------------------------------------------------

/// Production client: `ssh <host> gerrit ...` plus `git ls-remote` for refs.
#[derive(Debug, Clone)]
pub struct SshClient {
    host: String,
    port: u16,
    user: String,
    key: PathBuf,
}

impl SshClient {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>, key: PathBuf) -> Self {
        SshClient {
            host: host.into(),
            port,
            user: user.into(),
            key,
        }
    }

    /// Run one remote command, failing on non-zero exit status.
    fn remote(&self, command: &str) -> Result<String, GerritError> {
        let key = self.key.to_string_lossy();
        let port = self.port.to_string();
        let out = run(
            "ssh",
            &[
                "-i",
                key.as_ref(),
                "-p",
                &port,
                "-o",
                "StrictHostKeyChecking=no",
                "-l",
                &self.user,
                &self.host,
                command,
            ],
            &EnvOverlay::new(),
        )?;
        if !out.success() {
            return Err(GerritError::Command {
                command: command.to_string(),
                status: out.status,
                output: out.output,
            });
        }
        Ok(out.output)
    }
}

impl GerritClient for SshClient {
    fn list_projects(&self) -> Result<Vec<String>, GerritError> {
        let out = self.remote("gerrit ls-projects")?;
        Ok(out
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    fn list_refs(&self, project: &str) -> Result<Vec<String>, GerritError> {
        let url = format!(
            "ssh://{}@{}:{}/{}",
            self.user, self.host, self.port, project
        );
        let mut env = EnvOverlay::new();
        env.insert(
            "GIT_SSH_COMMAND".to_string(),
            format!(
                "ssh -i {} -o StrictHostKeyChecking=no",
                self.key.display()
            ),
        );
        let out = run("git", &["ls-remote", &url], &env)?;
        if !out.success() {
            return Err(GerritError::Command {
                command: format!("git ls-remote {url}"),
                status: out.status,
                output: out.output,
            });
        }
        Ok(parse_ls_remote(&out.output))
    }

    fn create_project(&self, name: &str) -> Result<(), GerritError> {
        self.remote(&format!("gerrit create-project {}", quote(name)))?;
        Ok(())
    }

    fn set_description(&self, name: &str, description: &str) -> Result<(), GerritError> {
        self.remote(&format!(
            "gerrit set-project {} --description {}",
            quote(name),
            quote(description)
        ))?;
        Ok(())
    }

    fn group_uuid(&self, name: &str) -> Result<Option<String>, GerritError> {
        let out = self.remote("gerrit ls-groups --verbose")?;
        Ok(parse_group_uuid(&out, name))
    }

    fn create_group(&self, name: &str) -> Result<(), GerritError> {
        self.remote(&format!("gerrit create-group {}", quote(name)))?;
        Ok(())
    }

    fn replicate(&self, name: &str) -> Result<(), GerritError> {
        self.remote(&format!("gerrit replicate {}", quote(name)))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

/// The remote side re-parses the command line through a shell; quote any
/// argument that may contain spaces.
fn quote(arg: &str) -> String {
    format!("\"{}\"", arg.replace('"', "\\\""))
}

/// `git ls-remote` output: `<sha>\t<refname>` per line.
fn parse_ls_remote(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .map(|r| r.trim().to_string())
        .collect()
}

/// `gerrit ls-groups --verbose` output: tab-separated columns, name first,
/// UUID second.
fn parse_group_uuid(output: &str, group: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut cols = line.split('\t');
        match (cols.next(), cols.next()) {
            (Some(name), Some(uuid)) if name == group => Some(uuid.trim().to_string()),
            _ => None,
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
