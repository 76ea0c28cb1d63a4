//! Prompt Registry
//!
//! Static mapping from document and agent identifiers to ordered prompt
//! templates and token budgets. Resolved once at startup from the YAML
//! manifest; immutable afterwards. Every template reference is resolved
//! through the prompt loader at load time, so a broken manifest fails the
//! process before it serves a single request.

mod manifest;

use std::collections::HashMap;
use std::sync::Arc;

use eyre::{Context, Result, eyre};
use tracing::debug;

use crate::prompts::PromptLoader;
use manifest::Manifest;

/// One independently-prompted sub-part of a multi-part document
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub id: String,
    pub title: String,
    /// Resolved template text (Handlebars source, not yet rendered)
    pub template: String,
    /// Token ceiling for this section's generation
    pub max_tokens: u32,
}

/// A multi-section document known to the registry
#[derive(Debug, Clone)]
pub struct DocumentSpec {
    pub id: String,
    pub title: String,
    /// Optional system prompt applied to every section call
    pub system: Option<String>,
    /// Sections in manifest declaration order
    pub sections: Vec<SectionSpec>,
}

/// A one-shot analyst agent that returns strict JSON
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub id: String,
    pub title: String,
    pub system: Option<String>,
    /// Resolved template text
    pub template: String,
    pub max_tokens: u32,
}

/// The registry itself
///
/// Lookups are O(1); iteration follows manifest declaration order so
/// listings are stable across calls.
#[derive(Debug)]
pub struct Registry {
    documents: HashMap<String, Arc<DocumentSpec>>,
    agents: HashMap<String, Arc<AgentSpec>>,
    document_order: Vec<String>,
    agent_order: Vec<String>,
}

impl Registry {
    /// Load the registry from the manifest, resolving every template
    ///
    /// Fails fast on duplicate ids, missing templates, or documents with
    /// no sections.
    pub fn load(loader: &PromptLoader) -> Result<Self> {
        debug!("Registry::load: called");
        let manifest_text = loader.load_manifest()?;
        let manifest: Manifest = serde_yaml::from_str(&manifest_text).context("Failed to parse registry manifest")?;

        let mut documents = HashMap::new();
        let mut document_order = Vec::new();

        for doc in manifest.documents {
            debug!(id = %doc.id, sections = doc.sections.len(), "Registry::load: loading document");
            if doc.sections.is_empty() {
                return Err(eyre!("Document '{}' has no sections", doc.id));
            }

            let mut sections = Vec::with_capacity(doc.sections.len());
            for section in &doc.sections {
                let template = loader
                    .load_template(&section.template)
                    .context(format!("Document '{}', section '{}'", doc.id, section.id))?;
                sections.push(SectionSpec {
                    id: section.id.clone(),
                    title: section.title.clone(),
                    template,
                    max_tokens: section.max_tokens,
                });
            }

            let spec = Arc::new(DocumentSpec {
                id: doc.id.clone(),
                title: doc.title,
                system: doc.system,
                sections,
            });

            if documents.insert(doc.id.clone(), spec).is_some() {
                return Err(eyre!("Duplicate document id in manifest: '{}'", doc.id));
            }
            document_order.push(doc.id);
        }

        let mut agents = HashMap::new();
        let mut agent_order = Vec::new();

        for agent in manifest.agents {
            debug!(id = %agent.id, "Registry::load: loading agent");
            let template = loader
                .load_template(&agent.template)
                .context(format!("Agent '{}'", agent.id))?;

            let spec = Arc::new(AgentSpec {
                id: agent.id.clone(),
                title: agent.title,
                system: agent.system,
                template,
                max_tokens: agent.max_tokens,
            });

            if agents.insert(agent.id.clone(), spec).is_some() {
                return Err(eyre!("Duplicate agent id in manifest: '{}'", agent.id));
            }
            agent_order.push(agent.id);
        }

        tracing::info!(
            documents = document_order.len(),
            agents = agent_order.len(),
            "Registry loaded"
        );

        Ok(Self {
            documents,
            agents,
            document_order,
            agent_order,
        })
    }

    /// Look up a document by id
    pub fn document(&self, id: &str) -> Option<Arc<DocumentSpec>> {
        self.documents.get(id).cloned()
    }

    /// Look up an agent by id
    pub fn agent(&self, id: &str) -> Option<Arc<AgentSpec>> {
        self.agents.get(id).cloned()
    }

    /// Documents in manifest declaration order
    pub fn documents(&self) -> impl Iterator<Item = Arc<DocumentSpec>> + '_ {
        self.document_order.iter().filter_map(|id| self.documents.get(id).cloned())
    }

    /// Agents in manifest declaration order
    pub fn agents(&self) -> impl Iterator<Item = Arc<AgentSpec>> + '_ {
        self.agent_order.iter().filter_map(|id| self.agents.get(id).cloned())
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}
