//! Template context — serializable rendering payload built from
//! [`ProjectConfig`].

use serde::{Deserialize, Serialize};

use drydock_core::types::ProjectConfig;

use crate::error::AclError;

/// Rendering payload. Templates address fields as `{{ project.name }}`,
/// `{{ project.description }}`, and so on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclContext {
    pub project: ProjectCtx,
}

/// Project attributes exposed to templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCtx {
    pub name: String,
    pub description: Option<String>,
    pub upstream: Option<String>,
    pub upstream_prefix: Option<String>,
    pub options: Vec<String>,
}

impl AclContext {
    /// Build an [`AclContext`] from a declared project.
    pub fn from_project(project: &ProjectConfig) -> Self {
        AclContext {
            project: ProjectCtx {
                name: project.project.0.clone(),
                description: project.description.clone(),
                upstream: project.upstream.clone(),
                upstream_prefix: project.upstream_prefix.clone(),
                options: project.options.clone(),
            },
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, AclError> {
        tera::Context::from_serialize(self).map_err(AclError::from)
    }
}
