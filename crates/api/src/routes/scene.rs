//! Route definitions for `/scenes`.

use axum::routing::get;
use axum::Router;

use crate::handlers::scene;
use crate::state::AppState;

/// Routes mounted at `/scenes`.
///
/// ```text
/// GET    /                  list_scenes
/// GET    /{id}              get_scene
/// PUT    /{id}              put_scene
/// GET    /{id}/neighbors    get_neighbors
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scene::list_scenes))
        .route("/{id}", get(scene::get_scene).put(scene::put_scene))
        .route("/{id}/neighbors", get(scene::get_neighbors))
        .method_not_allowed_fallback(super::method_not_allowed)
}
