//! AI feedback model and DTOs.
//!
//! `feedback_type` is one of the `aieditor_core::analysis::FEEDBACK_*`
//! kinds.

use aieditor_core::types::{SceneId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ai_feedback` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AiFeedback {
    pub id: i64,
    pub scene_id: SceneId,
    pub feedback_type: String,
    /// Style critique mode; `None` for other kinds.
    pub mode: Option<String>,
    pub feedback_text: String,
    /// Hash of the scene content the critique was written for.
    pub content_hash: String,
    pub created_at: Timestamp,
}

/// DTO for storing new feedback.
#[derive(Debug, Clone)]
pub struct CreateFeedback {
    pub scene_id: SceneId,
    pub feedback_type: String,
    pub mode: Option<String>,
    pub feedback_text: String,
    pub content_hash: String,
}
