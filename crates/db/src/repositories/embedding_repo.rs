//! Repository for the `scene_embeddings` table.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::embedding::SceneEmbedding;

const COLUMNS: &str = "scene_id, content_hash, dimensions, vector, created_at";

/// Stores one embedding vector per scene.
pub struct EmbeddingRepo;

impl EmbeddingRepo {
    /// All stored embeddings, current or stale.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<SceneEmbedding>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scene_embeddings ORDER BY scene_id");
        sqlx::query_as::<_, SceneEmbedding>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert or replace the embedding of a scene.
    pub async fn upsert(
        pool: &SqlitePool,
        scene_id: &str,
        content_hash: &str,
        vector: &[f32],
    ) -> Result<SceneEmbedding, sqlx::Error> {
        let query = format!(
            "INSERT INTO scene_embeddings (scene_id, content_hash, dimensions, vector, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (scene_id) DO UPDATE SET
                content_hash = excluded.content_hash,
                dimensions = excluded.dimensions,
                vector = excluded.vector,
                created_at = excluded.created_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SceneEmbedding>(&query)
            .bind(scene_id)
            .bind(content_hash)
            .bind(vector.len() as i64)
            .bind(Json(vector))
            .bind(chrono::Utc::now())
            .fetch_one(pool)
            .await
    }
}
