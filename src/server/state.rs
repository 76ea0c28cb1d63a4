//! Shared application state
//!
//! Read-only after startup and cloned into every handler; there is no
//! cross-request mutable state anywhere in the service.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::prompts::PromptLoader;
use crate::registry::Registry;
use crate::relay::StreamSettings;

/// Process-wide read-only state injected into handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub loader: Arc<PromptLoader>,
    /// None when the API key environment variable is unset; read-only
    /// routes still work, generation routes fail with a 500 naming the
    /// variable.
    pub llm: Option<Arc<dyn LlmClient>>,
    /// Model name echoed in stream metadata
    pub model: String,
    /// Environment variable the key is expected in, for error messages
    pub api_key_env: String,
    pub stream_settings: StreamSettings,
}

impl AppState {
    /// Assemble state from loaded configuration and components
    pub fn new(
        config: &Config,
        registry: Registry,
        loader: PromptLoader,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            loader: Arc::new(loader),
            llm,
            model: config.llm.model.clone(),
            api_key_env: config.llm.api_key_env.clone(),
            stream_settings: StreamSettings {
                section_timeout: Duration::from_millis(config.generation.section_timeout_ms),
            },
        }
    }
}
