//! Tera rendering engine over the on-disk policy directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::AclContext;
use crate::error::AclError;

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> AclError {
    AclError::Io {
        path: path.into(),
        source,
    }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), AclError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_templates(dir: &Path) -> Result<Vec<(String, String)>, AclError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(dir: &Path) -> Result<Tera, AclError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in load_templates(dir)? {
        templates.insert(name, content);
    }
    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// PolicyRenderer
// ---------------------------------------------------------------------------

/// Renders access-control policy templates from a policy directory.
///
/// Every file under the directory is a template, addressed by its path
/// relative to the directory (`nova.config`, `shared/openstack.config`).
/// Create once per run and reuse.
pub struct PolicyRenderer {
    tera: Tera,
}

impl PolicyRenderer {
    /// Load every template under `dir`. A missing directory yields an
    /// empty renderer (every lookup reports the template as absent).
    pub fn from_dir(dir: &Path) -> Result<Self, AclError> {
        Ok(PolicyRenderer {
            tera: build_tera(dir)?,
        })
    }

    /// A renderer with no templates, for sites without a policy directory.
    pub fn empty() -> Self {
        PolicyRenderer {
            tera: Tera::default(),
        }
    }

    /// True iff a template with this name was loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render the named template against the project context.
    pub fn render(&self, name: &str, ctx: &AclContext) -> Result<String, AclError> {
        if !self.has_template(name) {
            return Err(AclError::TemplateMissing {
                name: name.to_string(),
            });
        }
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(name, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
