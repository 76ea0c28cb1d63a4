//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for documents and agents.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (configured override directory)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution. Rendered
//! text goes into LLM prompts, so no HTML escaping is applied.

pub mod embedded;
mod loader;

pub use loader::PromptLoader;
