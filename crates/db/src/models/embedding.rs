//! Memoised scene embeddings.

use aieditor_core::types::{SceneId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `scene_embeddings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SceneEmbedding {
    pub scene_id: SceneId,
    /// Hash of the scene content the vector was computed from.
    pub content_hash: String,
    pub dimensions: i64,
    #[sqlx(json)]
    pub vector: Vec<f32>,
    pub created_at: Timestamp,
}

impl SceneEmbedding {
    /// Whether this embedding was computed from content with `content_hash`.
    pub fn is_current(&self, content_hash: &str) -> bool {
        self.content_hash == content_hash
    }
}
