#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use aieditor_api::config::{LlmConfig, RateLimitConfig, ServerConfig};
use aieditor_api::middleware::rate_limit::ClientRateLimiter;
use aieditor_api::router::build_app_router;
use aieditor_api::state::AppState;
use aieditor_core::analysis::AnalysisSettings;
use aieditor_db::DbPool;
use aieditor_llm::{BackendGate, BackendHealth, CompletionParams, LanguageModel, LlmError};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Number of dimensions of the fake embedding space.
const DIMENSIONS: usize = 64;

/// Build a test `ServerConfig` with safe defaults and a rate limit high
/// enough not to interfere.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: "sqlite::memory:".to_string(),
        llm: LlmConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 5,
            load_timeout_secs: 0,
        },
        rate_limit: RateLimitConfig {
            per_minute: NonZeroU32::new(10_000).unwrap(),
            burst: NonZeroU32::new(1_000).unwrap(),
        },
        analysis: AnalysisSettings {
            similarity_threshold: 0.6,
            similar_limit: 5,
        },
    }
}

/// Fresh in-memory database with migrations applied.
pub async fn test_pool() -> DbPool {
    let pool = aieditor_db::create_pool("sqlite::memory:").await.unwrap();
    aieditor_db::run_migrations(&pool).await.unwrap();
    pool
}

/// In-process language model.
///
/// Embeds text as a bag of words hashed into a small vector, so texts that
/// share words are similar. Completions answer summary prompts with JSON,
/// translation prompts with a fixed sentence, and anything else with a
/// critique.
#[derive(Default)]
pub struct FakeModel {
    pub embed_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
    /// When set, every model call fails like a crashed server.
    pub failing: AtomicBool,
    /// When set, summaries come back as prose instead of JSON.
    pub prose_summaries: AtomicBool,
    /// Fail the completion call with this 1-based number.
    pub fail_on_completion: AtomicUsize,
}

impl FakeModel {
    pub fn embeddings_computed(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> Result<(), LlmError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::Api {
                status: 500,
                body: "model crashed".to_string(),
            });
        }
        Ok(())
    }
}

fn bucket(word: &str) -> usize {
    let hash = word
        .bytes()
        .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
    hash as usize % DIMENSIONS
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn health(&self) -> Result<BackendHealth, LlmError> {
        Ok(BackendHealth::Ready)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.check_failing()?;
        self.embed_calls.fetch_add(1, Ordering::SeqCst);

        let mut vector = vec![0.0f32; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[bucket(&word.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, LlmError> {
        self.check_failing()?;
        let call = self.complete_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_completion.load(Ordering::SeqCst) == call {
            return Err(LlmError::Api {
                status: 500,
                body: "kv cache full".to_string(),
            });
        }

        if prompt.contains("\"character_dev\"") {
            if self.prose_summaries.load(Ordering::SeqCst) {
                return Ok("La scena racconta un addio.".to_string());
            }
            return Ok(format!(
                "```json\n{}\n```",
                json!({
                    "events": ["arrival", "departure"],
                    "character_dev": "Dana hesitates",
                    "details": [],
                    "style": format!("temperature {}", params.temperature),
                })
            ));
        }
        if prompt.contains("### English Translation:") {
            return Ok(format!("Translation ({} tokens max)", params.n_predict));
        }

        Ok(format!(
            "Critique ({} tokens max) of a {}-byte prompt",
            params.n_predict,
            prompt.len()
        ))
    }
}

/// Everything a test needs to drive the app and inspect its collaborators.
pub struct TestContext {
    pub pool: DbPool,
    pub model: Arc<FakeModel>,
    pub gate: Arc<BackendGate>,
    pub config: ServerConfig,
    rate_limiter: Arc<ClientRateLimiter>,
}

impl TestContext {
    /// Context with the model already loaded.
    pub async fn ready() -> Self {
        Self::with_config(test_config(), BackendGate::ready()).await
    }

    /// Context whose model is still loading.
    pub async fn loading() -> Self {
        Self::with_config(test_config(), BackendGate::new()).await
    }

    pub async fn with_config(config: ServerConfig, gate: BackendGate) -> Self {
        let rate_limiter = Arc::new(ClientRateLimiter::new(&config.rate_limit));
        Self {
            pool: test_pool().await,
            model: Arc::new(FakeModel::default()),
            gate: Arc::new(gate),
            config,
            rate_limiter,
        }
    }

    /// Build the full application router with all middleware layers.
    ///
    /// Every call shares the same database, model, gate and rate limiter.
    pub fn app(&self) -> Router {
        let state = AppState {
            pool: self.pool.clone(),
            config: Arc::new(self.config.clone()),
            model: self.model.clone(),
            gate: Arc::clone(&self.gate),
            rate_limiter: Arc::clone(&self.rate_limiter),
        };
        build_app_router(state, &self.config)
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn post(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri, Body::empty(), None).await
}

pub async fn put_json(app: Router, uri: &str, body: &Value) -> Response {
    send(
        app,
        Method::PUT,
        uri,
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

/// PUT an arbitrary (possibly malformed) body as JSON.
pub async fn put_raw(app: Router, uri: &str, body: &'static str) -> Response {
    send(app, Method::PUT, uri, Body::from(body), Some("application/json")).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<&str>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Store a scene and assert the write succeeded.
pub async fn put_scene(ctx: &TestContext, id: &str, content: &str, chapter: i64) -> Value {
    let response = put_json(
        ctx.app(),
        &format!("/api/v1/scenes/{id}"),
        &scene_body(content, chapter, "2024-06-01"),
    )
    .await;
    assert!(
        response.status() == StatusCode::CREATED || response.status() == StatusCode::OK,
        "unexpected status {}",
        response.status()
    );
    body_json(response).await
}

pub fn scene_body(content: &str, chapter: i64, revision: &str) -> Value {
    json!({
        "content": content,
        "metadata": { "chapter": chapter, "revision": revision }
    })
}
