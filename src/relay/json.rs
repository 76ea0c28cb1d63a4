//! JSON-from-model-output parsing
//!
//! The upstream model is instructed, not guaranteed, to emit valid JSON,
//! and often wraps it in markdown code fences. This is the one place that
//! contract is enforced: strip known fence markers, attempt a parse, and
//! on failure return the original text untouched for diagnosis. No repair,
//! no retry.

use thiserror::Error;
use tracing::debug;

/// Model output failed to parse as JSON after fence stripping
#[derive(Debug, Error)]
#[error("Model output is not valid JSON: {source}")]
pub struct ParseError {
    /// The original model output, before any stripping
    pub raw: String,
    #[source]
    pub source: serde_json::Error,
}

/// Strip markdown code-fence delimiters from model output
///
/// Handles ```` ```json ````- and ```` ``` ````-prefixed blocks with an
/// optional trailing ```` ``` ````. Text without fences passes through
/// trimmed.
pub fn strip_fences(text: &str) -> &str {
    debug!(len = text.len(), "strip_fences: called");
    let trimmed = text.trim();

    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        debug!("strip_fences: stripping ```json fence");
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        debug!("strip_fences: stripping bare ``` fence");
        rest
    } else {
        return trimmed;
    };

    inner.trim_end_matches("```").trim()
}

/// Parse model output as JSON, stripping fences first
///
/// On failure the error carries the original raw text, not the stripped
/// form, so the caller can surface exactly what the model said.
pub fn parse_model_output(text: &str) -> Result<serde_json::Value, ParseError> {
    debug!("parse_model_output: called");
    let stripped = strip_fences(text);
    serde_json::from_str(stripped).map_err(|source| {
        debug!(error = %source, "parse_model_output: parse failed");
        ParseError {
            raw: text.to_string(),
            source,
        }
    })
}
