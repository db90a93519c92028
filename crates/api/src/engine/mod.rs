//! Scene analysis engine.
//!
//! Contains the embedding-based analyzer behind `GET /analyze/scene/{id}`
//! and the completion flows behind the style, summary and translation
//! endpoints. All of them talk to the model only through
//! [`aieditor_llm::LanguageModel`].

pub mod analyzer;
pub mod style;
pub mod summary;
pub mod translation;

use aieditor_core::error::CoreError;
use aieditor_core::markup::to_plain_text;
use aieditor_db::models::scene::Scene;
use aieditor_db::repositories::SceneRepo;
use aieditor_db::DbPool;

use crate::error::AppError;

/// Load a scene and its plain text for a completion request.
///
/// Fails with 404 for an unknown scene and with a validation error when
/// nothing is left once markup is stripped, so the model is never asked
/// about an empty text.
pub(crate) async fn scene_with_text(
    pool: &DbPool,
    scene_id: &str,
) -> Result<(Scene, String), AppError> {
    let scene = SceneRepo::find_by_id(pool, scene_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Scene",
            id: scene_id.to_string(),
        })?;

    let text = plain_text(&scene)?;
    Ok((scene, text))
}

fn plain_text(scene: &Scene) -> Result<String, CoreError> {
    let text = to_plain_text(&scene.content);
    if text.trim().is_empty() {
        return Err(CoreError::Validation("Scene has no text to analyze".to_string()));
    }
    Ok(text)
}
