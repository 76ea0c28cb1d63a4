//! HTTP client for the draftsmith service
//!
//! Used by the CLI subcommands that talk to a running server. The
//! streaming consumer splits the NDJSON body on newlines and parses each
//! line independently, delivering events to a callback as they arrive.

use eyre::{Context, Result, eyre};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::events::StreamEvent;
use crate::server::{AnalyzeRequest, AnalyzeResponse, GenerateRequest, ListingResponse};

/// Error body returned by the server on failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    raw: Option<String>,
}

/// Client for a running draftsmith server
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given base URL (e.g. `http://127.0.0.1:7878`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        debug!(%base_url, "ApiClient::new: called");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Stream a document generation, invoking `on_event` per event
    ///
    /// Returns after the stream ends; a mid-stream `error` event is
    /// delivered to the callback like any other event (the HTTP status
    /// is already 200 by then).
    pub async fn generate(&self, request: &GenerateRequest, mut on_event: impl FnMut(StreamEvent)) -> Result<()> {
        debug!(document = %request.document_id, "ApiClient::generate: called");
        let response = self
            .http
            .post(format!("{}/generate", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to reach server")?;

        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read event stream")?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Complete lines only; a partial event stays buffered until
            // its newline arrives
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);
                if line.is_empty() {
                    continue;
                }

                match serde_json::from_str::<StreamEvent>(&line) {
                    Ok(event) => on_event(event),
                    Err(e) => warn!(error = %e, %line, "Skipping unparseable event line"),
                }
            }
        }

        Ok(())
    }

    /// Run an agent analysis
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse> {
        debug!(agent = %request.agent, "ApiClient::analyze: called");
        let response = self
            .http
            .post(format!("{}/analyze", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to reach server")?;

        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }

        response.json().await.context("Failed to parse analysis response")
    }

    /// Fetch the server's document and agent listing
    pub async fn documents(&self) -> Result<ListingResponse> {
        let response = self
            .http
            .get(format!("{}/documents", self.base_url))
            .send()
            .await
            .context("Failed to reach server")?;

        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }

        response.json().await.context("Failed to parse listing response")
    }

    /// Shape a non-success response into an error, keeping any raw model
    /// output the server attached
    async fn response_error(&self, response: reqwest::Response) -> eyre::Report {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => match body.raw {
                Some(raw) => eyre!("{} ({})\nRaw model output:\n{}", body.error, status, raw),
                None => eyre!("{} ({})", body.error, status),
            },
            Err(_) => eyre!("Server returned {}", status),
        }
    }
}
