//! Scene entity model and DTOs.

use aieditor_core::types::{SceneId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Scene metadata: `chapter` and `revision` are required, any other keys
/// the editor sends are kept in `extra` and returned alongside them.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub chapter: i64,
    pub revision: String,
    #[sqlx(json)]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scene {
    pub id: SceneId,
    pub title: Option<String>,
    pub content: String,
    #[sqlx(flatten)]
    pub metadata: SceneMetadata,
    pub content_hash: String,
    pub revision_status: String,
    pub position: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `PUT /scenes/{id}`. Replaces the stored scene wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct PutScene {
    pub content: String,
    pub metadata: SceneMetadata,
    #[serde(default)]
    pub title: Option<String>,
}
