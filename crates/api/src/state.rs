use std::sync::Arc;

use aieditor_llm::{BackendGate, LanguageModel};

use crate::config::ServerConfig;
use crate::middleware::rate_limit::ClientRateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: aieditor_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Language model used for embeddings and critiques.
    pub model: Arc<dyn LanguageModel>,
    /// Whether the model has finished loading.
    pub gate: Arc<BackendGate>,
    /// Per-client request quota for `/api/v1`.
    pub rate_limiter: Arc<ClientRateLimiter>,
}
