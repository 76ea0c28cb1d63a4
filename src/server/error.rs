//! API error type and response mapping
//!
//! Every handler failure becomes an [`ApiError`]; the `IntoResponse`
//! impl is the single place where errors are logged and shaped for the
//! client. Validation failures (unknown ids, bad indices, malformed
//! bodies) are 400s and never reach the upstream; everything else is a
//! 500 carrying the smallest useful message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::relay::BatchError;

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("LLM client not configured: set the {0} environment variable")]
    NotConfigured(String),

    #[error("Unknown document: '{0}'")]
    UnknownDocument(String),

    #[error("Unknown agent: '{0}'")]
    UnknownAgent(String),

    #[error("Section index {index} out of range for '{document}' ({count} sections)")]
    SectionOutOfRange {
        document: String,
        index: usize,
        count: usize,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),

    #[error("Failed to render prompt: {0}")]
    Render(String),

    #[error("Model output is not valid JSON")]
    Parse { raw: String },
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownDocument(_)
            | ApiError::UnknownAgent(_)
            | ApiError::SectionOutOfRange { .. }
            | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured(_)
            | ApiError::Upstream(_)
            | ApiError::Render(_)
            | ApiError::Parse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Render(msg) => ApiError::Render(msg),
            BatchError::Upstream(e) => ApiError::Upstream(e),
            BatchError::EmptyResponse => {
                ApiError::Upstream(LlmError::InvalidResponse("Model returned an empty response".to_string()))
            }
            BatchError::Parse(parse) => ApiError::Parse { raw: parse.raw },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(%status, error = ?self, "Request failed");
        } else {
            tracing::warn!(%status, %message, "Request rejected");
        }

        let body = match self {
            // Parse failures attach the raw model output for diagnosis
            ApiError::Parse { raw } => json!({"error": message, "raw": raw}),
            _ => json!({"error": message}),
        };

        (status, Json(body)).into_response()
    }
}
