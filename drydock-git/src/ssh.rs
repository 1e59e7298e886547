//! Per-run SSH credential wrapper.
//!
//! Git subprocesses authenticate against the review server through a
//! generated `GIT_SSH` script. The script is a process-wide resource:
//! created once before the batch begins, referenced by every subprocess
//! environment, and removed when the wrapper is dropped — on normal return,
//! early error, or unwind alike.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::ExecError;
use crate::exec::EnvOverlay;

/// Owns the wrapper script; deletes it on drop.
#[derive(Debug)]
pub struct SshWrapper {
    script: NamedTempFile,
    env: EnvOverlay,
}

impl SshWrapper {
    /// Write the wrapper script and build the `GIT_SSH` overlay.
    pub fn create(user: &str, key: &Path) -> Result<SshWrapper, ExecError> {
        let mut script = NamedTempFile::new()?;
        writeln!(script, "#!/bin/sh")?;
        writeln!(
            script,
            "exec ssh -i {} -l {} -o \"StrictHostKeyChecking no\" \"$@\"",
            key.display(),
            user
        )?;
        script.flush()?;
        set_executable(script.path())?;

        let mut env = EnvOverlay::new();
        env.insert(
            "GIT_SSH".to_string(),
            script.path().to_string_lossy().into_owned(),
        );
        Ok(SshWrapper { script, env })
    }

    /// Env overlay referencing the wrapper, for every git subprocess.
    pub fn env(&self) -> &EnvOverlay {
        &self.env
    }

    pub fn script_path(&self) -> &Path {
        self.script.path()
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
