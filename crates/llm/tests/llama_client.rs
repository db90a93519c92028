//! Integration tests for `LlamaCppClient` against an in-process server that
//! mimics the llama.cpp HTTP API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aieditor_llm::{BackendHealth, CompletionParams, LanguageModel, LlamaCppClient, LlmError};
use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Fake server
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct FakeServer {
    loaded: Arc<AtomicBool>,
}

async fn health(State(server): State<FakeServer>) -> (StatusCode, Json<Value>) {
    if server.loaded.load(Ordering::SeqCst) {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": { "code": 503, "message": "Loading model" } })),
        )
    }
}

async fn embedding(Json(body): Json<Value>) -> Json<Value> {
    let words = body["content"].as_str().unwrap_or_default().split_whitespace().count();
    Json(json!([{ "index": 0, "embedding": [[words as f32, 1.0]] }]))
}

async fn completion(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["prompt"] == "boom" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "kv cache full" })),
        );
    }
    let content = format!(
        "  n_predict={} top_k={} prompt={}  ",
        body["n_predict"], body["top_k"], body["prompt"].as_str().unwrap_or_default()
    );
    (StatusCode::OK, Json(json!({ "content": content, "stop": true })))
}

async fn spawn_server(server: FakeServer) -> SocketAddr {
    let app = Router::new()
        .route("/health", get(health))
        .route("/embedding", post(embedding))
        .route("/completion", post(completion))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client_for(server: FakeServer) -> LlamaCppClient {
    let addr = spawn_server(server).await;
    LlamaCppClient::new(format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_loading_then_ready() {
    let server = FakeServer::default();
    let client = client_for(server.clone()).await;

    assert_eq!(client.health().await.unwrap(), BackendHealth::Loading);

    server.loaded.store(true, Ordering::SeqCst);
    assert_eq!(client.health().await.unwrap(), BackendHealth::Ready);
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    // Nothing listens on the discard port.
    let client = LlamaCppClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    assert_matches!(client.health().await, Err(LlmError::Request(_)));
}

// ---------------------------------------------------------------------------
// Embeddings and completions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn embed_sends_content_and_parses_vector() {
    let client = client_for(FakeServer::default()).await;

    let vector = client.embed("three small words").await.unwrap();

    assert_eq!(vector, vec![3.0, 1.0]);
}

#[tokio::test]
async fn complete_sends_sampling_params_and_trims_output() {
    let client = client_for(FakeServer::default()).await;

    let text = client
        .complete("hello", CompletionParams::THOROUGH)
        .await
        .unwrap();

    assert_eq!(text, "n_predict=512 top_k=50 prompt=hello");
}

#[tokio::test]
async fn server_error_is_reported_with_status_and_body() {
    let client = client_for(FakeServer::default()).await;

    let err = client
        .complete("boom", CompletionParams::QUICK)
        .await
        .unwrap_err();

    assert_matches!(err, LlmError::Api { status: 500, ref body } if body.contains("kv cache full"));
}
