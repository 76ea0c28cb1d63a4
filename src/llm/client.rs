//! LlmClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{CompletionRequest, CompletionResponse, LlmError, StreamChunk};

/// Stateless LLM client - each call is independent (fresh context)
///
/// This is the core abstraction for talking to language models. Every
/// completion request is a new conversation; no state is carried between
/// calls. Section-to-section continuity is the caller's job (it goes into
/// the prompt, not the client).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    ///
    /// Used for agent calls where the whole response is parsed at once.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Streaming completion
    ///
    /// Sends chunks to the provided channel in arrival order as they are
    /// decoded. Returns the final complete response. If the receiver is
    /// dropped mid-stream, the upstream connection is closed and
    /// [`LlmError::Disconnected`] is returned.
    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError>;
}

impl std::fmt::Debug for dyn LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LlmClient")
    }
}
