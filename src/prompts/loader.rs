//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults, and renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory from config (e.g. `~/.config/draftsmith/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader with an optional override directory
    ///
    /// A configured directory that does not exist is ignored (with a log
    /// line) rather than treated as an error.
    pub fn new(override_dir: Option<impl AsRef<Path>>) -> Self {
        let override_dir = override_dir.map(|d| d.as_ref().to_path_buf());
        debug!(?override_dir, "PromptLoader::new: called");

        let override_dir = match override_dir {
            Some(dir) if dir.exists() => {
                debug!(?dir, "PromptLoader::new: override directory found");
                Some(dir)
            }
            Some(dir) => {
                tracing::warn!(?dir, "Configured prompts directory does not exist, using embedded prompts");
                None
            }
            None => {
                debug!("PromptLoader::new: no override directory configured");
                None
            }
        };

        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);

        Self { hbs, override_dir }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self::new(None::<PathBuf>)
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override directory: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in override directory");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            } else {
                debug!(?path, "PromptLoader::load_template: not found in override directory");
            }
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Load the registry manifest
    ///
    /// An override directory may carry its own `manifest.yml`; otherwise
    /// the embedded default is used.
    pub fn load_manifest(&self) -> Result<String> {
        debug!("PromptLoader::load_manifest: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join("manifest.yml");
            if path.exists() {
                debug!(?path, "PromptLoader::load_manifest: found in override directory");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read manifest {}: {}", path.display(), e));
            }
        }

        debug!("PromptLoader::load_manifest: using embedded manifest");
        Ok(embedded::MANIFEST.to_string())
    }

    /// Render template text with the given context
    pub fn render(&self, template: &str, context: &impl Serialize) -> Result<String> {
        debug!(template_len = template.len(), "PromptLoader::render: called");
        self.hbs
            .render_template(template, context)
            .map_err(|e| eyre!("Failed to render template: {}", e))
    }
}
