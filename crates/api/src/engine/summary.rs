//! Structured summary of a single scene.

use aieditor_core::analysis::FEEDBACK_SUMMARY;
use aieditor_db::models::feedback::{AiFeedback, CreateFeedback};
use aieditor_db::repositories::FeedbackRepo;
use aieditor_db::DbPool;
use aieditor_llm::prompts::summary_prompt;
use aieditor_llm::{parse_summary, CompletionParams, LanguageModel, SceneSummary};
use serde::Serialize;

use super::scene_with_text;
use crate::error::AppError;

/// A stored summary together with its parsed sections.
#[derive(Debug, Clone, Serialize)]
pub struct StoredSummary {
    #[serde(flatten)]
    pub feedback: AiFeedback,
    pub summary: SceneSummary,
}

/// Ask the model to summarise `scene_id` and store the result.
///
/// A completion that is not a JSON object with every section is a backend
/// error and nothing is stored.
pub async fn summarize_scene(
    pool: &DbPool,
    model: &dyn LanguageModel,
    scene_id: &str,
) -> Result<StoredSummary, AppError> {
    let (scene, text) = scene_with_text(pool, scene_id).await?;

    let completion = model
        .complete(&summary_prompt(&text), CompletionParams::SUMMARY)
        .await?;
    let summary = parse_summary(&completion)?;

    let stored_text = serde_json::to_string(&summary)
        .map_err(|e| AppError::InternalError(format!("Failed to encode summary: {e}")))?;

    let feedback = FeedbackRepo::create(
        pool,
        &CreateFeedback {
            scene_id: scene.id.clone(),
            feedback_type: FEEDBACK_SUMMARY.to_string(),
            mode: None,
            feedback_text: stored_text,
            content_hash: scene.content_hash.clone(),
        },
    )
    .await?;

    tracing::info!(scene_id = %scene.id, feedback_id = feedback.id, "Scene summary stored");
    Ok(StoredSummary { feedback, summary })
}
