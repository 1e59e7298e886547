//! Mirror provisioner — bare local replica directories.

use std::path::Path;

use drydock_git::exec::{run, EnvOverlay};
use drydock_git::repo;

use crate::error::SyncError;

/// Ensure the bare mirror for a project exists at `mirror_dir`.
///
/// No-op when the path already exists. A failed `git init --bare` removes
/// the partial directory before surfacing the error, so the mirror is
/// either fully created or absent. When `owner` is set the tree is
/// chowned to that `user:group`.
pub fn create_local_mirror(
    mirror_dir: &Path,
    owner: Option<(&str, &str)>,
) -> Result<(), SyncError> {
    if mirror_dir.exists() {
        return Ok(());
    }

    let out = repo::init_bare(mirror_dir)?;
    if !out.success() {
        let _ = std::fs::remove_dir_all(mirror_dir);
        return Err(SyncError::MirrorInit {
            path: mirror_dir.to_path_buf(),
            output: out.output,
        });
    }

    if let Some((user, group)) = owner {
        let ownership = format!("{user}:{group}");
        let path = mirror_dir.to_string_lossy();
        let chown = run("chown", &["-R", &ownership, path.as_ref()], &EnvOverlay::new())?;
        if !chown.success() {
            tracing::error!(
                "failed to chown mirror {} to {ownership}: {}",
                mirror_dir.display(),
                chown.output
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
