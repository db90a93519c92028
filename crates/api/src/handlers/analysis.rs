//! Handlers for `/analyze`.
//!
//! Anything that calls the model is gated: it fails with 423 until the
//! model has finished loading. Reading stored feedback is not.

use aieditor_core::analysis::{FeedbackKind, StyleMode, MODE_QUICK};
use aieditor_core::error::CoreError;
use aieditor_core::scene::validate_scene_id;
use aieditor_db::models::feedback::AiFeedback;
use aieditor_db::repositories::{FeedbackRepo, SceneRepo};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::engine::analyzer::{SceneAnalysis, SceneAnalyzer};
use crate::engine::style::{critique_pending, critique_scene, BatchOptions, BatchReport};
use crate::engine::summary::{summarize_scene, StoredSummary};
use crate::engine::translation::translate_scene;
use crate::error::{AppError, AppResult};
use crate::extract::{ValidPath, ValidQuery};
use crate::state::AppState;

/// Query parameters for `POST /analyze/scene/{id}/style`.
#[derive(Debug, Deserialize)]
pub struct StyleParams {
    /// `quick` (default) or `thorough`.
    pub mode: Option<String>,
}

/// Query parameters for `POST /analyze/style`.
#[derive(Debug, Deserialize)]
pub struct BatchStyleParams {
    /// Scene id to start from.
    pub from: Option<String>,
    /// Re-critique scenes that are already processed.
    #[serde(default)]
    pub force: bool,
    pub mode: Option<String>,
}

/// Query parameters for `GET /analyze/scene/{id}/feedback`.
#[derive(Debug, Deserialize)]
pub struct FeedbackParams {
    /// `style` (default), `summary` or `translation`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/v1/analyze/scene/{id}
pub async fn analyze_scene(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> AppResult<Json<SceneAnalysis>> {
    state.gate.check()?;
    validate_scene_id(&id)?;

    let analyzer = SceneAnalyzer::new(&state.pool, state.model.as_ref(), state.config.analysis);
    let analysis = analyzer.analyze(&id).await?;
    Ok(Json(analysis))
}

/// POST /api/v1/analyze/scene/{id}/style?mode=quick|thorough
pub async fn analyze_style(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
    ValidQuery(params): ValidQuery<StyleParams>,
) -> AppResult<(StatusCode, Json<AiFeedback>)> {
    state.gate.check()?;
    validate_scene_id(&id)?;
    let mode = parse_mode(params.mode.as_deref())?;

    let feedback = critique_scene(&state.pool, state.model.as_ref(), &id, mode).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// POST /api/v1/analyze/style?from={id}&force=bool&mode=quick|thorough
///
/// Critiques every scene still needing review, in reading order.
pub async fn analyze_style_batch(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<BatchStyleParams>,
) -> AppResult<Json<BatchReport>> {
    state.gate.check()?;
    if let Some(from) = &params.from {
        validate_scene_id(from)?;
    }
    let options = BatchOptions {
        mode: parse_mode(params.mode.as_deref())?,
        from: params.from,
        force: params.force,
    };

    let report = critique_pending(&state.pool, state.model.as_ref(), &options).await?;
    Ok(Json(report))
}

/// POST /api/v1/analyze/scene/{id}/summary
pub async fn analyze_summary(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> AppResult<(StatusCode, Json<StoredSummary>)> {
    state.gate.check()?;
    validate_scene_id(&id)?;

    let summary = summarize_scene(&state.pool, state.model.as_ref(), &id).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/v1/analyze/scene/{id}/translation
pub async fn analyze_translation(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> AppResult<(StatusCode, Json<AiFeedback>)> {
    state.gate.check()?;
    validate_scene_id(&id)?;

    let translation = translate_scene(&state.pool, state.model.as_ref(), &id).await?;
    Ok((StatusCode::CREATED, Json(translation)))
}

/// GET /api/v1/analyze/scene/{id}/feedback?type=style|summary|translation
///
/// Latest stored feedback of the given kind for the scene.
pub async fn latest_feedback(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
    ValidQuery(params): ValidQuery<FeedbackParams>,
) -> AppResult<Json<AiFeedback>> {
    validate_scene_id(&id)?;
    let kind = match params.kind.as_deref() {
        Some(kind) => FeedbackKind::parse(kind)?,
        None => FeedbackKind::Style,
    };

    if !SceneRepo::exists(&state.pool, &id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Scene",
            id,
        }));
    }

    let Some(feedback) = FeedbackRepo::latest_for_scene(&state.pool, &id, kind.as_str()).await?
    else {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Feedback for scene",
            id,
        }));
    };
    Ok(Json(feedback))
}

fn parse_mode(mode: Option<&str>) -> Result<StyleMode, CoreError> {
    StyleMode::parse(mode.unwrap_or(MODE_QUICK))
}
