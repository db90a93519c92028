//! English translation of a single scene.

use aieditor_core::analysis::FEEDBACK_TRANSLATION;
use aieditor_db::models::feedback::{AiFeedback, CreateFeedback};
use aieditor_db::repositories::FeedbackRepo;
use aieditor_db::DbPool;
use aieditor_llm::prompts::translation_prompt;
use aieditor_llm::{CompletionParams, LanguageModel};

use super::scene_with_text;
use crate::error::AppError;

/// Translate `scene_id` to English and store the translation.
pub async fn translate_scene(
    pool: &DbPool,
    model: &dyn LanguageModel,
    scene_id: &str,
) -> Result<AiFeedback, AppError> {
    let (scene, text) = scene_with_text(pool, scene_id).await?;

    let translation = model
        .complete(&translation_prompt(&text), CompletionParams::TRANSLATION)
        .await?;

    let feedback = FeedbackRepo::create(
        pool,
        &CreateFeedback {
            scene_id: scene.id.clone(),
            feedback_type: FEEDBACK_TRANSLATION.to_string(),
            mode: None,
            feedback_text: translation,
            content_hash: scene.content_hash.clone(),
        },
    )
    .await?;

    tracing::info!(
        scene_id = %scene.id,
        feedback_id = feedback.id,
        chars = feedback.feedback_text.chars().count(),
        "Scene translation stored",
    );
    Ok(feedback)
}
