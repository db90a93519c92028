//! Style critique of a single scene, and of the whole manuscript in reading
//! order.

use aieditor_core::analysis::{StyleMode, FEEDBACK_STYLE};
use aieditor_core::error::CoreError;
use aieditor_core::scene::needs_review;
use aieditor_db::models::feedback::{AiFeedback, CreateFeedback};
use aieditor_db::models::scene::Scene;
use aieditor_db::repositories::{FeedbackRepo, SceneRepo};
use aieditor_db::DbPool;
use aieditor_llm::prompts::style_analysis_prompt;
use aieditor_llm::{CompletionParams, LanguageModel};
use serde::Serialize;

use super::{plain_text, scene_with_text};
use crate::error::AppError;

/// Ask the model for a style critique of `scene_id`, store it, and mark the
/// scene `ai_processed`.
///
/// The status only changes if the scene was not edited while the model was
/// working.
pub async fn critique_scene(
    pool: &DbPool,
    model: &dyn LanguageModel,
    scene_id: &str,
    mode: StyleMode,
) -> Result<AiFeedback, AppError> {
    let (scene, text) = scene_with_text(pool, scene_id).await?;
    critique_loaded(pool, model, &scene, &text, mode).await
}

async fn critique_loaded(
    pool: &DbPool,
    model: &dyn LanguageModel,
    scene: &Scene,
    text: &str,
    mode: StyleMode,
) -> Result<AiFeedback, AppError> {
    let critique = model
        .complete(&style_analysis_prompt(text), CompletionParams::for_mode(mode))
        .await?;

    let feedback = FeedbackRepo::create(
        pool,
        &CreateFeedback {
            scene_id: scene.id.clone(),
            feedback_type: FEEDBACK_STYLE.to_string(),
            mode: Some(mode.as_str().to_string()),
            feedback_text: critique,
            content_hash: scene.content_hash.clone(),
        },
    )
    .await?;

    let processed = SceneRepo::mark_processed(pool, &scene.id, &scene.content_hash).await?;
    tracing::info!(
        scene_id = %scene.id,
        mode = mode.as_str(),
        feedback_id = feedback.id,
        processed,
        "Style critique stored",
    );

    Ok(feedback)
}

// ---------------------------------------------------------------------------
// Batch pass
// ---------------------------------------------------------------------------

/// Options for [`critique_pending`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Scene to start from. The pass wraps around to the scenes before it.
    /// `None` starts at the first scene.
    pub from: Option<String>,
    /// Critique scenes that are already `ai_processed` too.
    pub force: bool,
    pub mode: StyleMode,
}

/// What a batch pass did, scene ids in the order they were visited.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Number of scenes visited.
    pub total: usize,
    /// Scenes that received a new critique.
    pub processed: Vec<String>,
    /// Scenes left alone: already processed, or without text.
    pub skipped: Vec<String>,
}

/// Critique every scene that still needs review, in reading order.
///
/// Stops at the first model or database error. Critiques stored up to that
/// point are kept and those scenes are `ai_processed`, so running the pass
/// again resumes where it stopped.
pub async fn critique_pending(
    pool: &DbPool,
    model: &dyn LanguageModel,
    options: &BatchOptions,
) -> Result<BatchReport, AppError> {
    let mut scenes = SceneRepo::list(pool).await?;

    if let Some(from) = &options.from {
        let start = scenes
            .iter()
            .position(|s| &s.id == from)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Scene",
                id: from.clone(),
            })?;
        scenes.rotate_left(start);
    }

    let total = scenes.len();
    let mut report = BatchReport {
        total,
        ..Default::default()
    };

    for (index, scene) in scenes.iter().enumerate() {
        tracing::debug!(current = index + 1, total, scene_id = %scene.id, "Batch critique progress");

        if !options.force && !needs_review(&scene.revision_status) {
            report.skipped.push(scene.id.clone());
            continue;
        }
        let Ok(text) = plain_text(scene) else {
            report.skipped.push(scene.id.clone());
            continue;
        };

        critique_loaded(pool, model, scene, &text, options.mode).await?;
        report.processed.push(scene.id.clone());
    }

    tracing::info!(
        total,
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        force = options.force,
        "Batch style critique finished",
    );
    Ok(report)
}
