pub mod analysis;
pub mod health;
pub mod scene;

use aieditor_core::error::CoreError;
use axum::http::Uri;
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /scenes                                list (?chapter=, ?needs_review=)
/// /scenes/{id}                           get, put (create or overwrite)
/// /scenes/{id}/neighbors                 previous/next in reading order
///
/// /analyze/style                         batch style critique (POST, ?from=&force=&mode=)
/// /analyze/scene/{id}                    similar scenes + theme consistency
/// /analyze/scene/{id}/style              style critique (POST, ?mode=)
/// /analyze/scene/{id}/summary            structured summary (POST)
/// /analyze/scene/{id}/translation        English translation (POST)
/// /analyze/scene/{id}/feedback           latest stored feedback (?type=)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/scenes", scene::router())
        .nest("/analyze", analysis::router())
}

/// Fallback for paths no route matches.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Route",
        id: uri.path().to_string(),
    })
}

/// Fallback for known paths requested with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
