use aieditor_llm::BackendState;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the database is reachable and the model is loaded,
    /// `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Model lifecycle: `loading`, `ready` or `failed`.
    pub backend: BackendState,
}

/// GET /health -- returns service, database and model health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = aieditor_db::health_check(&state.pool).await.is_ok();
    let backend = state.gate.state();

    let status = if db_healthy && backend == BackendState::Ready {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        backend,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .method_not_allowed_fallback(super::method_not_allowed)
}
