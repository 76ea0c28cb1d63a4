//! draftsmith - streaming LLM document generator for startup ventures
//!
//! draftsmith turns a venture description into structured business
//! documents (pitch decks, financial models, legal packs, roadmaps) and
//! one-shot analyst verdicts by orchestrating calls to an upstream LLM
//! API. Multi-section documents stream back as newline-delimited JSON
//! events; analyst agents return a single strict-JSON body.
//!
//! # Core Concepts
//!
//! - **Static registry**: documents, sections, and agents come from a
//!   YAML manifest resolved once at startup; nothing mutates afterwards
//! - **Sequential sections**: later sections see the finalized text of
//!   earlier ones, so generation never fans out
//! - **Forward, don't buffer**: upstream fragments are re-emitted in
//!   arrival order the moment they are decoded
//! - **No silent recovery**: one failure ends a job with a single error;
//!   the caller owns retries
//!
//! # Modules
//!
//! - [`registry`] - document/agent registry loaded from the manifest
//! - [`prompts`] - template loading and Handlebars rendering
//! - [`llm`] - LLM client trait and Anthropic implementation
//! - [`relay`] - streaming and batch relays between model and client
//! - [`events`] - the NDJSON stream event vocabulary
//! - [`server`] - axum HTTP service
//! - [`client`] - CLI-side HTTP client
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod events;
pub mod llm;
pub mod prompts;
pub mod registry;
pub mod relay;
pub mod server;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::{Config, GenerationConfig, LlmConfig, PromptsConfig, ServerConfig};
pub use events::StreamEvent;
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use prompts::PromptLoader;
pub use registry::{AgentSpec, DocumentSpec, Registry, SectionSpec};
pub use relay::{AgentJob, BatchError, DocumentJob, ParseError, StreamSettings};
pub use server::{ApiError, AppState};
