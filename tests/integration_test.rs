//! Integration tests for draftsmith
//!
//! These spin up the real HTTP service on an ephemeral port, pointed at a
//! stub upstream that mimics the Anthropic Messages API (SSE streaming
//! included) and counts every invocation. That makes the core contract
//! verifiable end to end: validation failures must never reach the
//! upstream, and streams must follow the event grammar exactly.

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use draftsmith::config::Config;
use draftsmith::events::StreamEvent;
use draftsmith::llm;
use draftsmith::prompts::PromptLoader;
use draftsmith::registry::Registry;
use draftsmith::server::{AppState, router};

const TEST_KEY_VAR: &str = "DRAFTSMITH_TEST_API_KEY";

static SET_KEY: Once = Once::new();

fn ensure_test_key() {
    // Same variable, same value, set once before any client is built
    SET_KEY.call_once(|| unsafe { std::env::set_var(TEST_KEY_VAR, "test-key") });
}

// =============================================================================
// Stub upstream
// =============================================================================

#[derive(Clone)]
struct StubConfig {
    /// Zero-based call index that should fail with a 500, if any
    fail_on: Option<usize>,
    /// Text returned by non-streaming (batch) calls
    batch_text: String,
    calls: Arc<AtomicUsize>,
}

struct StubUpstream {
    base_url: String,
    calls: Arc<AtomicUsize>,
}

/// Start a fake Anthropic Messages endpoint on an ephemeral port
async fn spawn_stub(fail_on: Option<usize>, batch_text: &str) -> StubUpstream {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = StubConfig {
        fail_on,
        batch_text: batch_text.to_string(),
        calls: calls.clone(),
    };

    let app = Router::new().route("/v1/messages", post(stub_messages)).with_state(config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubUpstream {
        base_url: format!("http://{}", addr),
        calls,
    }
}

async fn stub_messages(State(stub): State<StubConfig>, Json(body): Json<Value>) -> axum::response::Response {
    let call = stub.calls.fetch_add(1, Ordering::SeqCst);

    if stub.fail_on == Some(call) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "stub upstream failure").into_response();
    }

    if body["stream"].as_bool().unwrap_or(false) {
        // Two text fragments per section, standard Anthropic SSE shape
        let sse = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":10}}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"alpha \"}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"beta\"}}\n\n",
            "event: message_delta\n",
            "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":2}}\n\n",
            "event: message_stop\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
    } else {
        Json(json!({
            "content": [{"type": "text", "text": stub.batch_text}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 50, "output_tokens": 25},
        }))
        .into_response()
    }
}

// =============================================================================
// App helpers
// =============================================================================

/// Start a real draftsmith server pointed at the stub upstream
async fn spawn_app(stub_base_url: &str) -> String {
    ensure_test_key();

    let mut config = Config::default();
    config.llm.api_key_env = TEST_KEY_VAR.to_string();
    config.llm.base_url = stub_base_url.to_string();
    config.generation.section_timeout_ms = 5_000;

    let loader = PromptLoader::embedded_only();
    let registry = Registry::load(&loader).unwrap();
    let llm_client = llm::create_client(&config.llm).unwrap();
    let state = AppState::new(&config, registry, loader, Some(llm_client));

    spawn_router(state).await
}

/// Start a server with no LLM client configured
async fn spawn_unconfigured_app() -> String {
    let config = Config::default();
    let loader = PromptLoader::embedded_only();
    let registry = Registry::load(&loader).unwrap();
    let state = AppState::new(&config, registry, loader, None);

    spawn_router(state).await
}

async fn spawn_router(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

/// POST /generate and parse the NDJSON body into events
async fn stream_events(base: &str, body: Value) -> Vec<StreamEvent> {
    let response = reqwest::Client::new()
        .post(format!("{}/generate", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE.as_str()],
        "application/x-ndjson"
    );

    let text = response.text().await.unwrap();
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn event_types(events: &[StreamEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.event_type()).collect()
}

fn section_starts(events: &[StreamEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::SectionStart { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Registry routes
// =============================================================================

#[tokio::test]
async fn test_config_returns_order_stable_sections_for_all_documents() {
    let stub = spawn_stub(None, "{}").await;
    let base = spawn_app(&stub.base_url).await;
    let client = reqwest::Client::new();

    let listing: Value = client
        .get(format!("{}/documents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let documents = listing["documents"].as_array().unwrap();
    assert!(!documents.is_empty());

    for doc in documents {
        let id = doc["id"].as_str().unwrap();
        let url = format!("{}/config?itemId={}", base, id);

        let first: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
        let second: Value = client.get(&url).send().await.unwrap().json().await.unwrap();

        assert_eq!(first["documentId"], id);
        assert!(!first["sections"].as_array().unwrap().is_empty());
        assert_eq!(first["sections"], second["sections"], "section order unstable for {}", id);
    }

    // Pure registry reads never touch the upstream
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_ids_fail_fast_without_upstream_contact() {
    let stub = spawn_stub(None, "{}").await;
    let base = spawn_app(&stub.base_url).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/config?itemId=no-such-document", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{}/generate", base))
        .json(&json!({"documentId": "no-such-document", "ventureId": "v-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("no-such-document"));

    let response = client
        .post(format!("{}/analyze", base))
        .json(&json!({"agent": "no-such-agent"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_section_index_out_of_range_is_400() {
    let stub = spawn_stub(None, "{}").await;
    let base = spawn_app(&stub.base_url).await;

    let response = reqwest::Client::new()
        .post(format!("{}/generate", base))
        .json(&json!({"documentId": "roadmap", "ventureId": "v-1", "sectionIndex": 99}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let stub = spawn_stub(None, "{}").await;
    let base = spawn_app(&stub.base_url).await;

    // Missing required ventureId
    let response = reqwest::Client::new()
        .post(format!("{}/generate", base))
        .json(&json!({"documentId": "roadmap"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Streaming relay
// =============================================================================

#[tokio::test]
async fn test_streaming_full_document_event_grammar() {
    let stub = spawn_stub(None, "{}").await;
    let base = spawn_app(&stub.base_url).await;

    let events = stream_events(
        &base,
        json!({
            "documentId": "roadmap",
            "ventureId": "v-1",
            "context": {"company_name": "Roboto", "description": "sidewalk robots"},
        }),
    )
    .await;

    let types = event_types(&events);
    assert_eq!(types.first(), Some(&"metadata"));
    assert_eq!(types.last(), Some(&"done"));
    assert_eq!(types.iter().filter(|t| **t == "done").count(), 1);

    // Roadmap has three sections: one start/complete pair each, in order
    assert_eq!(section_starts(&events), vec![0, 1, 2]);
    let completes: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::SectionComplete { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(completes, vec![0, 1, 2]);

    // No delta after done
    let done_pos = types.iter().position(|t| *t == "done").unwrap();
    assert!(!types[done_pos..].contains(&"delta"));

    // One upstream call per section, sequentially
    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);

    // Metadata reports the full section count
    match &events[0] {
        StreamEvent::Metadata {
            document_id,
            section_count,
            ..
        } => {
            assert_eq!(document_id, "roadmap");
            assert_eq!(*section_count, 3);
        }
        other => panic!("expected metadata, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upstream_failure_mid_document_emits_single_error() {
    // Section 0 succeeds, section 1 hits a 500
    let stub = spawn_stub(Some(1), "{}").await;
    let base = spawn_app(&stub.base_url).await;

    let events = stream_events(&base, json!({"documentId": "roadmap", "ventureId": "v-1"})).await;

    let types = event_types(&events);
    assert_eq!(types.iter().filter(|t| **t == "error").count(), 1);
    assert_eq!(types.last(), Some(&"error"));
    assert!(!types.contains(&"done"));

    // No section_start past the failed section
    assert_eq!(section_starts(&events), vec![0, 1]);

    // Section 2 was never attempted upstream
    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_single_section_requests_are_idempotent() {
    let stub = spawn_stub(None, "{}").await;
    let base = spawn_app(&stub.base_url).await;

    let body = json!({"documentId": "pitch-deck", "ventureId": "v-1", "sectionIndex": 2});
    let first = stream_events(&base, body.clone()).await;
    let second = stream_events(&base, body).await;

    // Equivalent event sequences: same types, same section, same text
    assert_eq!(event_types(&first), event_types(&second));
    assert_eq!(section_starts(&first), vec![2]);
    assert_eq!(section_starts(&second), vec![2]);

    let text = |events: &[StreamEvent]| -> String {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Delta { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    };
    assert_eq!(text(&first), text(&second));
    assert_eq!(text(&first), "alpha beta");

    // One upstream call each; no cross-request state
    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Batch relay
// =============================================================================

#[tokio::test]
async fn test_analyze_strips_fences_and_returns_usage() {
    let stub = spawn_stub(None, "```json\n{\"score\": 7}\n```").await;
    let base = spawn_app(&stub.base_url).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", base))
        .json(&json!({"agent": "viability", "inputFields": {"description": "robots"}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["agent"], "viability");
    assert_eq!(body["result"], json!({"score": 7}));
    assert_eq!(body["usage"]["inputTokens"], 50);
    assert_eq!(body["usage"]["outputTokens"], 25);
}

#[tokio::test]
async fn test_analyze_invalid_json_is_500_with_raw_text() {
    let stub = spawn_stub(None, "not json").await;
    let base = spawn_app(&stub.base_url).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", base))
        .json(&json!({"agent": "viability"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["raw"], "not json");
    assert!(body["error"].as_str().unwrap().contains("JSON"));

    // Exactly one upstream call: no retry, no repair
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_unconfigured_server_serves_reads_but_not_generation() {
    let base = spawn_unconfigured_app().await;
    let client = reqwest::Client::new();

    // Read-only routes still work
    let response = client.get(format!("{}/config?itemId=pitch-deck", base)).send().await.unwrap();
    assert_eq!(response.status(), 200);

    // Generation fails with an explicit "not configured" error naming the var
    let response = client
        .post(format!("{}/generate", base))
        .json(&json!({"documentId": "pitch-deck", "ventureId": "v-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("ANTHROPIC_API_KEY"));

    // Validation still precedes the configuration check
    let response = client
        .post(format!("{}/generate", base))
        .json(&json!({"documentId": "nope", "ventureId": "v-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_health_reports_registry_counts() {
    let stub = spawn_stub(None, "{}").await;
    let base = spawn_app(&stub.base_url).await;

    let body: Value = reqwest::Client::new()
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["documents"], 4);
    assert_eq!(body["agents"], 4);
}
