//! Site settings and project-list loading.
//!
//! Two YAML files, loaded once at startup:
//!
//! ```text
//! site.yaml       (gerrit-host, gerrit-key, cache-dir, ... → Settings)
//! projects.yaml   (ordered list of project descriptors → ProjectRegistry)
//! ```
//!
//! Both loaders return [`ConfigError::NotFound`] when the file is absent and
//! [`ConfigError::Parse`] (with path + line context) when malformed.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::{ProjectConfig, Settings};

/// The declared project set, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRegistry {
    projects: Vec<ProjectConfig>,
}

impl ProjectRegistry {
    /// All declared projects, in the order they were written.
    pub fn projects(&self) -> &[ProjectConfig] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Look up a project by name.
    pub fn get(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.project.0 == name)
    }

    /// Projects matching an explicit subset of names, in declaration order.
    /// An empty subset selects everything.
    pub fn select(&self, names: &[String]) -> Vec<&ProjectConfig> {
        if names.is_empty() {
            return self.projects.iter().collect();
        }
        self.projects
            .iter()
            .filter(|p| names.iter().any(|n| *n == p.project.0))
            .collect()
    }
}

/// Load site [`Settings`] from a YAML file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let contents = read(path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load the declared project list from a YAML file.
pub fn load_registry(path: &Path) -> Result<ProjectRegistry, ConfigError> {
    let contents = read(path)?;
    let projects: Vec<ProjectConfig> =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(ProjectRegistry { projects })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
