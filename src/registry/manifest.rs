//! Manifest file format
//!
//! Serde types for the YAML manifest that declares documents, their
//! sections, and analyst agents. Template references are resolved by the
//! registry at load time; these types only mirror the file.

use serde::Deserialize;

/// Top-level manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub documents: Vec<ManifestDocument>,
    pub agents: Vec<ManifestAgent>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            agents: Vec::new(),
        }
    }
}

/// A document declaration
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub system: Option<String>,
    pub sections: Vec<ManifestSection>,
}

/// A section declaration within a document
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSection {
    pub id: String,
    pub title: String,
    /// Template name, resolved through the prompt loader
    pub template: String,
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

/// An analyst agent declaration
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestAgent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub system: Option<String>,
    /// Template name, resolved through the prompt loader
    pub template: String,
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}
