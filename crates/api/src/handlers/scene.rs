//! Handlers for the `/scenes` resource.
//!
//! Scenes are addressed by the editor's own opaque ids and are written with
//! `PUT` (create or overwrite). There is no delete.

use aieditor_core::error::CoreError;
use aieditor_core::scene::{
    needs_review, validate_chapter, validate_content, validate_revision, validate_scene_id,
    validate_title,
};
use aieditor_db::models::scene::{PutScene, Scene};
use aieditor_db::repositories::scene_repo::SceneNeighbors;
use aieditor_db::repositories::SceneRepo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /scenes`.
#[derive(Debug, Deserialize)]
pub struct ListScenesParams {
    /// Only scenes of this chapter.
    pub chapter: Option<i64>,
    /// Only scenes without style feedback for their current content.
    #[serde(default)]
    pub needs_review: bool,
}

/// PUT /api/v1/scenes/{id}
///
/// Creates the scene (201) or overwrites it (200). Replaying the same body
/// leaves the stored scene untouched.
pub async fn put_scene(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
    ValidJson(input): ValidJson<PutScene>,
) -> AppResult<(StatusCode, Json<Scene>)> {
    validate_scene_id(&id)?;
    validate_put(&input)?;

    let outcome = SceneRepo::upsert(&state.pool, &id, &input).await?;
    tracing::info!(
        scene_id = %id,
        chapter = input.metadata.chapter,
        created = outcome.created,
        modified = outcome.modified,
        "Scene written",
    );

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.scene)))
}

/// GET /api/v1/scenes
pub async fn list_scenes(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListScenesParams>,
) -> AppResult<Json<DataResponse<Vec<Scene>>>> {
    let mut scenes = match params.chapter {
        Some(chapter) => SceneRepo::list_by_chapter(&state.pool, chapter).await?,
        None => SceneRepo::list(&state.pool).await?,
    };
    if params.needs_review {
        scenes.retain(|s| needs_review(&s.revision_status));
    }
    Ok(Json(DataResponse { data: scenes }))
}

/// GET /api/v1/scenes/{id}
pub async fn get_scene(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> AppResult<Json<Scene>> {
    validate_scene_id(&id)?;
    let scene = SceneRepo::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| scene_not_found(&id))?;
    Ok(Json(scene))
}

/// GET /api/v1/scenes/{id}/neighbors
///
/// Previous and next scene in reading order (chapter, then position).
pub async fn get_neighbors(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> AppResult<Json<SceneNeighbors>> {
    validate_scene_id(&id)?;
    let neighbors = SceneRepo::neighbors(&state.pool, &id)
        .await?
        .ok_or_else(|| scene_not_found(&id))?;
    Ok(Json(neighbors))
}

fn validate_put(input: &PutScene) -> Result<(), CoreError> {
    validate_content(&input.content)?;
    validate_chapter(input.metadata.chapter)?;
    validate_revision(&input.metadata.revision)?;
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    Ok(())
}

fn scene_not_found(id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Scene",
        id: id.to_string(),
    })
}
