//! Stream event vocabulary
//!
//! These events are the wire format of a document generation stream:
//! one metadata preamble, then a `section_start`/`delta`*/`section_complete`
//! run per section, then a single `done` — or a single `error` that
//! terminates the stream early.
//!
//! Framing is newline-delimited JSON: each event serializes to one JSON
//! object followed by `\n`. Newlines inside payload text are JSON-escaped,
//! so an event never spans lines and clients can split on `\n` and parse
//! each line independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event in a generation stream
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Stream preamble: everything a client needs to render progress
    #[serde(rename_all = "camelCase")]
    Metadata {
        generation_id: String,
        document_id: String,
        venture_id: String,
        title: String,
        section_count: usize,
        model: String,
        started_at: DateTime<Utc>,
    },

    /// A section's generation is starting
    #[serde(rename_all = "camelCase")]
    SectionStart {
        id: String,
        title: String,
        index: usize,
        total: usize,
    },

    /// An incremental text fragment, forwarded in arrival order
    #[serde(rename_all = "camelCase")]
    Delta { index: usize, text: String },

    /// A section finished generating
    #[serde(rename_all = "camelCase")]
    SectionComplete { index: usize, output_tokens: u64 },

    /// All requested sections finished; aggregate usage
    #[serde(rename_all = "camelCase")]
    Done { input_tokens: u64, output_tokens: u64 },

    /// The stream failed; no further events follow
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl StreamEvent {
    /// Get the event type tag
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Metadata { .. } => "metadata",
            StreamEvent::SectionStart { .. } => "section_start",
            StreamEvent::Delta { .. } => "delta",
            StreamEvent::SectionComplete { .. } => "section_complete",
            StreamEvent::Done { .. } => "done",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Serialize to one NDJSON line (JSON object + trailing newline)
    ///
    /// Serialization of this enum cannot realistically fail; if it somehow
    /// does, a hand-built error line is emitted so the stream framing stays
    /// intact.
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json + "\n",
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize stream event");
                "{\"type\":\"error\",\"message\":\"event serialization failed\"}\n".to_string()
            }
        }
    }
}
