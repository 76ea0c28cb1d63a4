//! HTTP routes and handlers
//!
//! Five routes, two shapes: read-only registry lookups answered from
//! `AppState`, and the two generation routes that relay to the upstream
//! model. Validation order is fixed: request-level failures (unknown
//! ids, bad indices, malformed bodies) return 400 before the API-key
//! check, so a misconfigured server still rejects bad requests the
//! same way a healthy one does.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::llm::LlmClient;
use crate::relay::{AgentJob, DocumentJob, run_agent, stream_document};

use super::error::ApiError;
use super::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/documents", get(list_documents))
        .route("/config", get(document_config))
        .route("/generate", post(generate))
        .route("/analyze", post(analyze))
        .with_state(state)
}

// === Wire types (shared with the CLI client) ===

/// Body of `POST /generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "ventureId")]
    pub venture_id: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(rename = "sectionIndex", skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub section_index: Option<usize>,
}

/// Body of `POST /analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub agent: String,
    #[serde(rename = "inputFields")]
    #[serde(default)]
    pub input_fields: Map<String, Value>,
}

/// Response of `POST /analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub agent: String,
    pub result: Value,
    pub usage: UsageInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageInfo {
    #[serde(rename = "inputTokens")]
    pub input_tokens: u64,
    #[serde(rename = "outputTokens")]
    pub output_tokens: u64,
}

/// Response of `GET /config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub title: String,
    pub sections: Vec<SectionInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInfo {
    pub id: String,
    pub title: String,
}

/// Response of `GET /documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub documents: Vec<DocumentInfo>,
    pub agents: Vec<AgentInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub title: String,
    #[serde(rename = "sectionCount")]
    pub section_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct ConfigQuery {
    #[serde(rename = "itemId")]
    item_id: String,
}

// === Handlers ===

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "documents": state.registry.document_count(),
        "agents": state.registry.agent_count(),
    }))
}

async fn list_documents(State(state): State<AppState>) -> Json<ListingResponse> {
    debug!("list_documents: called");
    let documents = state
        .registry
        .documents()
        .map(|d| DocumentInfo {
            id: d.id.clone(),
            title: d.title.clone(),
            section_count: d.sections.len(),
        })
        .collect();
    let agents = state
        .registry
        .agents()
        .map(|a| AgentInfo {
            id: a.id.clone(),
            title: a.title.clone(),
        })
        .collect();

    Json(ListingResponse { documents, agents })
}

async fn document_config(
    State(state): State<AppState>,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    debug!(item_id = %query.item_id, "document_config: called");

    let doc = state
        .registry
        .document(&query.item_id)
        .ok_or_else(|| ApiError::UnknownDocument(query.item_id.clone()))?;

    Ok(Json(ConfigResponse {
        document_id: doc.id.clone(),
        title: doc.title.clone(),
        sections: doc
            .sections
            .iter()
            .map(|s| SectionInfo {
                id: s.id.clone(),
                title: s.title.clone(),
            })
            .collect(),
    }))
}

async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    debug!(document = %request.document_id, venture = %request.venture_id, "generate: called");

    // Validation first: bad requests never reach the upstream, configured
    // or not
    let document = state
        .registry
        .document(&request.document_id)
        .ok_or_else(|| ApiError::UnknownDocument(request.document_id.clone()))?;

    if let Some(index) = request.section_index
        && index >= document.sections.len()
    {
        return Err(ApiError::SectionOutOfRange {
            document: document.id.clone(),
            index,
            count: document.sections.len(),
        });
    }

    let llm = require_llm(&state)?;

    let generation_id = Uuid::now_v7().to_string();
    info!(
        %generation_id,
        document = %document.id,
        venture = %request.venture_id,
        section = ?request.section_index,
        "Starting document generation"
    );

    let job = DocumentJob {
        generation_id,
        document,
        venture_id: request.venture_id,
        context: request.context,
        section_index: request.section_index,
        model: state.model.clone(),
    };

    let (event_tx, event_rx) = mpsc::channel(32);
    tokio::spawn(stream_document(
        llm,
        state.loader.clone(),
        state.stream_settings,
        job,
        event_tx,
    ));

    // NDJSON body: one line per event, flushed as produced. A dropped
    // client closes the channel, which the relay sees as a failed send.
    let stream = futures::stream::unfold(event_rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(Bytes::from(event.to_line())), rx))
    });

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    debug!(agent = %request.agent, "analyze: called");

    let agent = state
        .registry
        .agent(&request.agent)
        .ok_or_else(|| ApiError::UnknownAgent(request.agent.clone()))?;

    let llm = require_llm(&state)?;

    info!(agent = %agent.id, "Running agent analysis");
    let outcome = run_agent(
        llm.as_ref(),
        &state.loader,
        AgentJob {
            agent,
            input: request.input_fields,
        },
    )
    .await
    .map_err(ApiError::from)?;

    Ok(Json(AnalyzeResponse {
        agent: request.agent,
        result: outcome.result,
        usage: UsageInfo {
            input_tokens: outcome.usage.input_tokens,
            output_tokens: outcome.usage.output_tokens,
        },
    }))
}

/// The configuration check, after request validation
fn require_llm(state: &AppState) -> Result<std::sync::Arc<dyn LlmClient>, ApiError> {
    state
        .llm
        .clone()
        .ok_or_else(|| ApiError::NotConfigured(state.api_key_env.clone()))
}
