//! Non-streaming JSON relay
//!
//! Runs one analyst agent: render the agent's prompt, make a single
//! blocking completion call, and parse the model's text output as JSON.
//! A parse failure is surfaced with the raw text attached; nothing is
//! retried or repaired.

use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, TokenUsage};
use crate::prompts::PromptLoader;
use crate::registry::AgentSpec;

use super::json::{ParseError, parse_model_output};

/// One agent invocation, built by the handler after validation
pub struct AgentJob {
    pub agent: Arc<AgentSpec>,
    /// Request `inputFields`, interpolated into the agent template
    pub input: Map<String, Value>,
}

/// Result of a successful agent run
#[derive(Debug)]
pub struct AgentOutcome {
    pub result: Value,
    pub usage: TokenUsage,
}

/// Errors from a batch agent run
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to render agent prompt: {0}")]
    Render(String),

    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Run one agent call end to end
pub async fn run_agent(llm: &dyn LlmClient, loader: &PromptLoader, job: AgentJob) -> Result<AgentOutcome, BatchError> {
    debug!(agent = %job.agent.id, "run_agent: called");

    let mut context = job.input.clone();
    context.insert("agent_title".to_string(), Value::String(job.agent.title.clone()));

    let prompt = loader
        .render(&job.agent.template, &context)
        .map_err(|e| BatchError::Render(e.to_string()))?;

    let request = CompletionRequest {
        system: job.agent.system.clone(),
        messages: vec![Message::user(prompt)],
        max_tokens: job.agent.max_tokens,
    };

    let response = llm.complete(request).await?;
    debug!(agent = %job.agent.id, output_tokens = response.usage.output_tokens, "run_agent: completion received");

    let text = response.content.ok_or(BatchError::EmptyResponse)?;
    let result = parse_model_output(&text)?;

    Ok(AgentOutcome {
        result,
        usage: response.usage,
    })
}
