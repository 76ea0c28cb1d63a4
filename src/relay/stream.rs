//! Streaming relay
//!
//! Drives the generation of a multi-section document, converting the
//! upstream model's incremental output into the [`StreamEvent`] vocabulary.
//! Sections run strictly sequentially: later sections' prompts include the
//! finalized text of earlier ones (the `previous` render key), so there is
//! no parallel fan-out and total latency is the sum of per-section
//! latencies.
//!
//! Failure policy: one upstream failure, render failure, or expired
//! section deadline emits a single `error` event and ends the stream.
//! Already-sent output is not retracted and nothing is retried; the caller
//! re-requests, optionally with a section index to redo only the failed
//! section.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::events::StreamEvent;
use crate::llm::{CompletionRequest, LlmClient, Message, StopReason, StreamChunk, TokenUsage};
use crate::prompts::PromptLoader;
use crate::registry::{DocumentSpec, SectionSpec};

/// One document generation job, built by the handler after validation
///
/// Validation (document exists, section index in range) happens before a
/// job is constructed; by the time the relay runs, every failure mode left
/// is a mid-stream one.
pub struct DocumentJob {
    pub generation_id: String,
    pub document: Arc<DocumentSpec>,
    pub venture_id: String,
    /// Request `context` fields, interpolated into every section template
    pub context: Map<String, Value>,
    /// Regenerate only this section instead of all of them
    pub section_index: Option<usize>,
    /// Model name, echoed in the metadata event
    pub model: String,
}

/// Relay tuning, from config
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// Deadline for a single section's generation
    pub section_timeout: Duration,
}

/// Generate a document, emitting events to `event_tx`
///
/// All outcomes are reported through the event channel; there is no
/// return value. If the receiver goes away (client disconnect), the
/// upstream call is aborted and the relay stops silently.
pub async fn stream_document(
    llm: Arc<dyn LlmClient>,
    loader: Arc<PromptLoader>,
    settings: StreamSettings,
    job: DocumentJob,
    event_tx: mpsc::Sender<StreamEvent>,
) {
    let doc = &job.document;
    let total = doc.sections.len();
    debug!(
        generation_id = %job.generation_id,
        document = %doc.id,
        venture = %job.venture_id,
        section_index = ?job.section_index,
        "stream_document: called"
    );

    let metadata = StreamEvent::Metadata {
        generation_id: job.generation_id.clone(),
        document_id: doc.id.clone(),
        venture_id: job.venture_id.clone(),
        title: doc.title.clone(),
        section_count: total,
        model: job.model.clone(),
        started_at: Utc::now(),
    };
    if event_tx.send(metadata).await.is_err() {
        debug!("stream_document: client gone before metadata");
        return;
    }

    // Section index was validated by the handler; a single section job
    // still reports `total` as the document's full section count.
    let indices: Vec<usize> = match job.section_index {
        Some(index) => vec![index],
        None => (0..total).collect(),
    };

    let mut previous = String::new();
    let mut usage = TokenUsage::default();

    for index in indices {
        let section = &doc.sections[index];

        let start = StreamEvent::SectionStart {
            id: section.id.clone(),
            title: section.title.clone(),
            index,
            total,
        };
        if event_tx.send(start).await.is_err() {
            debug!(%index, "stream_document: client gone at section start");
            return;
        }

        let prompt = match render_section(&loader, &job, section, &previous) {
            Ok(prompt) => prompt,
            Err(message) => {
                warn!(%index, %message, "Section prompt render failed");
                let _ = event_tx.send(StreamEvent::Error { message }).await;
                return;
            }
        };

        let request = CompletionRequest {
            system: doc.system.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: section.max_tokens,
        };

        match run_section(&llm, &settings, request, index, &event_tx).await {
            SectionOutcome::Complete { text, section_usage } => {
                usage.add(section_usage);
                if !previous.is_empty() {
                    previous.push_str("\n\n");
                }
                previous.push_str(&format!("## {}\n\n{}", section.title, text));

                let complete = StreamEvent::SectionComplete {
                    index,
                    output_tokens: section_usage.output_tokens,
                };
                if event_tx.send(complete).await.is_err() {
                    debug!(%index, "stream_document: client gone at section complete");
                    return;
                }
            }
            SectionOutcome::Failed { message } => {
                debug!(%index, %message, "stream_document: section failed, ending stream");
                let _ = event_tx.send(StreamEvent::Error { message }).await;
                return;
            }
            SectionOutcome::ClientGone => {
                debug!(%index, "stream_document: client disconnected mid-section");
                return;
            }
        }
    }

    debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "stream_document: done"
    );
    let _ = event_tx
        .send(StreamEvent::Done {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        })
        .await;
}

/// How a single section's generation ended
enum SectionOutcome {
    Complete { text: String, section_usage: TokenUsage },
    Failed { message: String },
    ClientGone,
}

/// Render one section's prompt
///
/// The request context is merged with the reserved keys; reserved keys
/// win so a request cannot spoof `previous` or the identifiers.
fn render_section(
    loader: &PromptLoader,
    job: &DocumentJob,
    section: &SectionSpec,
    previous: &str,
) -> Result<String, String> {
    let mut context = job.context.clone();
    context.insert("venture_id".to_string(), json!(job.venture_id));
    context.insert("document_title".to_string(), json!(job.document.title));
    context.insert("section_title".to_string(), json!(section.title));
    context.insert("previous".to_string(), json!(previous));

    loader.render(&section.template, &context).map_err(|e| e.to_string())
}

/// Drive one upstream streaming call under the section deadline
///
/// The upstream call runs in its own task so an expired deadline or a
/// vanished client can abort it (dropping the connection) instead of
/// letting it burn tokens to completion.
async fn run_section(
    llm: &Arc<dyn LlmClient>,
    settings: &StreamSettings,
    request: CompletionRequest,
    index: usize,
    event_tx: &mpsc::Sender<StreamEvent>,
) -> SectionOutcome {
    let deadline = Instant::now() + settings.section_timeout;
    let (chunk_tx, mut chunk_rx) = mpsc::channel::<StreamChunk>(32);

    let llm = Arc::clone(llm);
    let upstream = tokio::spawn(async move { llm.stream(request, chunk_tx).await });

    loop {
        let chunk = match tokio::time::timeout_at(deadline, chunk_rx.recv()).await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(_) => {
                warn!(%index, timeout = ?settings.section_timeout, "Section deadline expired");
                upstream.abort();
                return SectionOutcome::Failed {
                    message: format!(
                        "Section {} timed out after {}ms",
                        index,
                        settings.section_timeout.as_millis()
                    ),
                };
            }
        };

        match chunk {
            StreamChunk::TextDelta(text) => {
                let delta = StreamEvent::Delta { index, text };
                if event_tx.send(delta).await.is_err() {
                    // Client disconnect: stop consuming upstream tokens
                    upstream.abort();
                    return SectionOutcome::ClientGone;
                }
            }
            StreamChunk::MessageStart { input_tokens } => {
                debug!(%index, %input_tokens, "run_section: message start");
            }
            StreamChunk::MessageDone { stop_reason, .. } => {
                debug!(%index, ?stop_reason, "run_section: message done");
            }
            StreamChunk::Error(message) => {
                debug!(%index, %message, "run_section: upstream error chunk");
                // The final error surfaces through the task result below
            }
        }
    }

    match upstream.await {
        Ok(Ok(response)) => {
            if response.stop_reason == StopReason::MaxTokens {
                warn!(%index, "Section hit its token ceiling; output may be truncated");
            }
            SectionOutcome::Complete {
                text: response.content.unwrap_or_default(),
                section_usage: response.usage,
            }
        }
        Ok(Err(e)) => SectionOutcome::Failed { message: e.to_string() },
        Err(e) => SectionOutcome::Failed {
            message: format!("Generation task failed: {}", e),
        },
    }
}
