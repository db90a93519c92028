//! Route definitions for `/analyze`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

/// Routes mounted at `/analyze`.
///
/// ```text
/// POST   /style                     analyze_style_batch
/// GET    /scene/{id}                analyze_scene
/// POST   /scene/{id}/style          analyze_style
/// POST   /scene/{id}/summary        analyze_summary
/// POST   /scene/{id}/translation    analyze_translation
/// GET    /scene/{id}/feedback       latest_feedback
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/style", post(analysis::analyze_style_batch))
        .route("/scene/{id}", get(analysis::analyze_scene))
        .route("/scene/{id}/style", post(analysis::analyze_style))
        .route("/scene/{id}/summary", post(analysis::analyze_summary))
        .route("/scene/{id}/translation", post(analysis::analyze_translation))
        .route("/scene/{id}/feedback", get(analysis::latest_feedback))
        .method_not_allowed_fallback(super::method_not_allowed)
}
