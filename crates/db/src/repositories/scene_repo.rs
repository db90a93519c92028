//! Repository for the `scenes` table.

use aieditor_core::hashing::content_hash;
use aieditor_core::scene::{POSITION_STEP, STATUS_AI_PROCESSED, STATUS_UNPROCESSED, STATUS_UNREVIEWED};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::scene::{PutScene, Scene};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, content, chapter, revision, extra, content_hash, \
    revision_status, position, created_at, updated_at";

/// Reading order of scenes across the manuscript.
const READING_ORDER: &str = "chapter ASC, position ASC, id ASC";

/// Outcome of [`SceneRepo::upsert`].
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub scene: Scene,
    /// `true` when no scene with this id existed before.
    pub created: bool,
    /// `true` when the stored row changed (always `true` on create).
    pub modified: bool,
}

/// Previous/next scene ids in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SceneNeighbors {
    pub previous: Option<String>,
    pub next: Option<String>,
}

/// Provides storage operations for scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// Create or replace a scene.
    ///
    /// A single `INSERT .. ON CONFLICT DO UPDATE` statement, so the write is
    /// atomic and visible to the next read. Replaying an identical payload
    /// leaves the row untouched (`updated_at`, status and position included).
    ///
    /// - New scenes start `unreviewed` and are appended to their chapter.
    /// - A content change moves the scene to `unprocessed`.
    /// - A chapter change appends the scene to the new chapter.
    pub async fn upsert(
        pool: &SqlitePool,
        id: &str,
        input: &PutScene,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let existed = Self::exists(pool, id).await?;
        let hash = content_hash(&input.content);
        let now = chrono::Utc::now();

        let query = format!(
            "INSERT INTO scenes
                (id, title, content, chapter, revision, extra, content_hash,
                 revision_status, position, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, '{STATUS_UNREVIEWED}',
                 (SELECT COALESCE(MAX(position), 0) + {POSITION_STEP} FROM scenes WHERE chapter = $4),
                 $8, $8)
             ON CONFLICT (id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                revision = excluded.revision,
                extra = excluded.extra,
                content_hash = excluded.content_hash,
                revision_status = CASE
                    WHEN scenes.content_hash = excluded.content_hash THEN scenes.revision_status
                    ELSE '{STATUS_UNPROCESSED}'
                END,
                position = CASE
                    WHEN scenes.chapter = excluded.chapter THEN scenes.position
                    ELSE excluded.position
                END,
                chapter = excluded.chapter,
                updated_at = excluded.updated_at
             WHERE scenes.title IS NOT excluded.title
                OR scenes.content_hash <> excluded.content_hash
                OR scenes.chapter <> excluded.chapter
                OR scenes.revision <> excluded.revision
                OR scenes.extra <> excluded.extra
             RETURNING {COLUMNS}"
        );

        let written = sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.metadata.chapter)
            .bind(&input.metadata.revision)
            .bind(Json(&input.metadata.extra))
            .bind(&hash)
            .bind(now)
            .fetch_optional(pool)
            .await?;

        let modified = written.is_some();
        let scene = match written {
            Some(scene) => scene,
            // The conflict clause's WHERE filtered the update out: the row
            // already holds exactly this payload.
            None => Self::find_by_id(pool, id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?,
        };

        if modified {
            tracing::debug!(scene_id = %id, created = !existed, "Scene stored");
        }

        Ok(UpsertOutcome {
            scene,
            created: !existed,
            modified,
        })
    }

    /// Whether a scene with this id exists.
    pub async fn exists(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM scenes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    /// Find a scene by id.
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all scenes in reading order.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes ORDER BY {READING_ORDER}");
        sqlx::query_as::<_, Scene>(&query).fetch_all(pool).await
    }

    /// List the scenes of one chapter in reading order.
    pub async fn list_by_chapter(
        pool: &SqlitePool,
        chapter: i64,
    ) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenes WHERE chapter = $1 ORDER BY {READING_ORDER}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(chapter)
            .fetch_all(pool)
            .await
    }

    /// Previous and next scene around `id` in reading order.
    ///
    /// Returns `None` if the scene does not exist.
    pub async fn neighbors(
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Option<SceneNeighbors>, sqlx::Error> {
        let Some(scene) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let previous: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM scenes
             WHERE (chapter, position, id) < ($1, $2, $3)
             ORDER BY chapter DESC, position DESC, id DESC
             LIMIT 1",
        )
        .bind(scene.metadata.chapter)
        .bind(scene.position)
        .bind(&scene.id)
        .fetch_optional(pool)
        .await?;

        let next: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM scenes
             WHERE (chapter, position, id) > ($1, $2, $3)
             ORDER BY chapter ASC, position ASC, id ASC
             LIMIT 1",
        )
        .bind(scene.metadata.chapter)
        .bind(scene.position)
        .bind(&scene.id)
        .fetch_optional(pool)
        .await?;

        Ok(Some(SceneNeighbors {
            previous: previous.map(|(id,)| id),
            next: next.map(|(id,)| id),
        }))
    }

    /// Mark a scene `ai_processed`, but only if its content still hashes to
    /// `content_hash` (an edit during analysis keeps it `unprocessed`).
    ///
    /// Returns `true` if the status was updated.
    pub async fn mark_processed(
        pool: &SqlitePool,
        id: &str,
        content_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scenes SET revision_status = $3 WHERE id = $1 AND content_hash = $2",
        )
        .bind(id)
        .bind(content_hash)
        .bind(STATUS_AI_PROCESSED)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
