//! Domain types for the drydock registry.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Field names mirror the YAML keys operators write (`upstream-prefix`,
//! `acl-config`, `gerrit-host`, ...).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Option flag: mirror every upstream branch into the review server.
pub const OPT_TRACK_UPSTREAM: &str = "track-upstream";
/// Option flag: the project is declared but must produce no side effects.
pub const OPT_NO_GERRIT: &str = "no-gerrit";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed project name.
///
/// Also used to derive the server-side repository path and local mirror path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Project descriptor
// ---------------------------------------------------------------------------

/// One declared project — a single entry of the project list file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name; the YAML key is `project`.
    pub project: ProjectName,

    /// Free-form option flags; recognized values are
    /// [`OPT_TRACK_UPSTREAM`] and [`OPT_NO_GERRIT`].
    #[serde(default)]
    pub options: Vec<String>,

    /// Human description applied to the server record when no policy file
    /// is synced for this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Source repository URL to import/track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    /// Branch-namespace prefix for upstream-derived local branches.
    #[serde(
        default,
        rename = "upstream-prefix",
        skip_serializing_if = "Option::is_none"
    )]
    pub upstream_prefix: Option<String>,

    /// Access-control template file, relative to the policy directory.
    /// Defaults to `<name>.config`.
    #[serde(default, rename = "acl-config", skip_serializing_if = "Option::is_none")]
    pub acl_config: Option<String>,
}

impl ProjectConfig {
    /// Minimal descriptor with just a name; everything else defaulted.
    pub fn named(name: impl Into<ProjectName>) -> Self {
        ProjectConfig {
            project: name.into(),
            options: Vec::new(),
            description: None,
            upstream: None,
            upstream_prefix: None,
            acl_config: None,
        }
    }

    pub fn name(&self) -> &ProjectName {
        &self.project
    }

    /// True iff `track-upstream` appears in `options`.
    pub fn track_upstream(&self) -> bool {
        self.options.iter().any(|o| o == OPT_TRACK_UPSTREAM)
    }

    /// True iff `no-gerrit` appears in `options` — the project is skipped
    /// entirely, with no server or mirror side effects.
    pub fn review_disabled(&self) -> bool {
        self.options.iter().any(|o| o == OPT_NO_GERRIT)
    }

    /// Template file name for this project's access-control policy.
    pub fn acl_file_name(&self) -> String {
        self.acl_config
            .clone()
            .unwrap_or_else(|| format!("{}.config", self.project))
    }
}

// ---------------------------------------------------------------------------
// Site settings
// ---------------------------------------------------------------------------

/// Site-wide settings, constructed once from the `--conf` file and passed
/// explicitly into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "gerrit-host")]
    pub gerrit_host: String,

    #[serde(rename = "gerrit-port", default = "default_gerrit_port")]
    pub gerrit_port: u16,

    #[serde(rename = "gerrit-user")]
    pub gerrit_user: String,

    /// SSH private key used for every server interaction.
    #[serde(rename = "gerrit-key")]
    pub gerrit_key: PathBuf,

    /// Author identity for generated commits,
    /// e.g. `Project Creator <infra@example.org>`.
    #[serde(rename = "gerrit-committer")]
    pub committer: String,

    /// Root of the local bare-mirror pool.
    #[serde(rename = "local-git-dir", default = "default_local_git_dir")]
    pub local_git_dir: PathBuf,

    /// Root of the local working-copy cache.
    #[serde(rename = "cache-dir", default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Directory holding access-control policy templates.
    #[serde(rename = "acl-dir", default, skip_serializing_if = "Option::is_none")]
    pub acl_dir: Option<PathBuf>,

    /// System account that must own the mirror pool. Chown is skipped when
    /// absent.
    #[serde(
        rename = "gerrit-system-user",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub system_user: Option<String>,

    #[serde(
        rename = "gerrit-system-group",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub system_group: Option<String>,
}

fn default_gerrit_port() -> u16 {
    29418
}

fn default_local_git_dir() -> PathBuf {
    PathBuf::from("/var/lib/git")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("/var/tmp/cache")
}

impl Settings {
    /// Base of every project remote URL: `ssh://<host>:<port>`.
    pub fn remote_base(&self) -> String {
        format!("ssh://{}:{}", self.gerrit_host, self.gerrit_port)
    }
}

// ---------------------------------------------------------------------------
// Repository locations
// ---------------------------------------------------------------------------

/// Where a project lives: server remote, working copy, bare mirror.
///
/// Recomputed each run from [`Layout`]; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocations {
    /// `<remote_base>/<name>`
    pub remote_url: String,
    /// `<cache-dir>/<name>`
    pub work_dir: PathBuf,
    /// `<local-git-dir>/<name>.git`
    pub mirror_dir: PathBuf,
}

/// Derives [`RepoLocations`] for any project.
///
/// Production code builds this from [`Settings`]; tests substitute a
/// `file://` remote base and temp directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub remote_base: String,
    pub cache_dir: PathBuf,
    pub mirror_root: PathBuf,
}

impl Layout {
    pub fn from_settings(settings: &Settings) -> Self {
        Layout {
            remote_base: settings.remote_base(),
            cache_dir: settings.cache_dir.clone(),
            mirror_root: settings.local_git_dir.clone(),
        }
    }

    pub fn locations(&self, name: &ProjectName) -> RepoLocations {
        RepoLocations {
            remote_url: format!("{}/{}", self.remote_base, name),
            work_dir: self.cache_dir.join(&name.0),
            mirror_dir: self.mirror_root.join(format!("{}.git", name)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
