//! Repository for the `ai_feedback` table.

use sqlx::SqlitePool;

use crate::models::feedback::{AiFeedback, CreateFeedback};

const COLUMNS: &str = "id, scene_id, feedback_type, mode, feedback_text, content_hash, created_at";

/// Provides insert and lookup for AI feedback.
pub struct FeedbackRepo;

impl FeedbackRepo {
    /// Store new feedback, returning the created row.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateFeedback,
    ) -> Result<AiFeedback, sqlx::Error> {
        let query = format!(
            "INSERT INTO ai_feedback
                (scene_id, feedback_type, mode, feedback_text, content_hash, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AiFeedback>(&query)
            .bind(&input.scene_id)
            .bind(&input.feedback_type)
            .bind(&input.mode)
            .bind(&input.feedback_text)
            .bind(&input.content_hash)
            .bind(chrono::Utc::now())
            .fetch_one(pool)
            .await
    }

    /// Newest feedback of `feedback_type` for a scene.
    pub async fn latest_for_scene(
        pool: &SqlitePool,
        scene_id: &str,
        feedback_type: &str,
    ) -> Result<Option<AiFeedback>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ai_feedback
             WHERE scene_id = $1 AND feedback_type = $2
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, AiFeedback>(&query)
            .bind(scene_id)
            .bind(feedback_type)
            .fetch_optional(pool)
            .await
    }
}
