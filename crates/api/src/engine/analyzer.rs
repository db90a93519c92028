//! Similar-scene and theme-consistency analysis.
//!
//! Every scene is embedded once per content revision; vectors are stored
//! with the content hash they were computed from and refreshed when the
//! hash changes. Results are computed on demand and never stored.

use std::collections::HashMap;

use aieditor_core::analysis::{rank_similar, theme_consistency, AnalysisSettings, Candidate};
use aieditor_core::error::CoreError;
use aieditor_core::markup::to_plain_text;
use aieditor_db::models::scene::Scene;
use aieditor_db::repositories::{EmbeddingRepo, SceneRepo};
use aieditor_db::DbPool;
use aieditor_llm::LanguageModel;
use serde::Serialize;

use crate::error::AppError;

/// Result of analysing one scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneAnalysis {
    /// Ids of the most similar other scenes, best match first.
    pub similar_scenes: Vec<String>,
    /// How well the scene fits the rest of the manuscript, in `[0, 1]`.
    pub theme_consistency: f64,
}

/// Runs the analysis for one request.
pub struct SceneAnalyzer<'a> {
    pool: &'a DbPool,
    model: &'a dyn LanguageModel,
    settings: AnalysisSettings,
}

impl<'a> SceneAnalyzer<'a> {
    pub fn new(pool: &'a DbPool, model: &'a dyn LanguageModel, settings: AnalysisSettings) -> Self {
        Self {
            pool,
            model,
            settings,
        }
    }

    /// Analyse `scene_id` against every other stored scene.
    pub async fn analyze(&self, scene_id: &str) -> Result<SceneAnalysis, AppError> {
        let scenes = SceneRepo::list(self.pool).await?;
        if !scenes.iter().any(|s| s.id == scene_id) {
            return Err(CoreError::NotFound {
                entity: "Scene",
                id: scene_id.to_string(),
            }
            .into());
        }

        let vectors = self.ensure_embeddings(&scenes).await?;
        let target = vectors
            .get(scene_id)
            .ok_or_else(|| AppError::InternalError(format!("No embedding for scene {scene_id}")))?;

        let candidates: Vec<Candidate<'_>> = scenes
            .iter()
            .filter_map(|s| {
                vectors.get(&s.id).map(|v| Candidate {
                    id: &s.id,
                    embedding: v,
                })
            })
            .collect();

        let similar = rank_similar(scene_id, target, &candidates, &self.settings);
        let theme = theme_consistency(scene_id, target, &candidates);

        tracing::debug!(
            scene_id = %scene_id,
            compared = candidates.len().saturating_sub(1),
            similar = similar.len(),
            theme_consistency = theme,
            "Scene analysed",
        );

        Ok(SceneAnalysis {
            similar_scenes: similar.into_iter().map(|s| s.id).collect(),
            theme_consistency: theme,
        })
    }

    /// Return one vector per scene, embedding scenes whose stored vector is
    /// missing or was computed from older content.
    async fn ensure_embeddings(
        &self,
        scenes: &[Scene],
    ) -> Result<HashMap<String, Vec<f32>>, AppError> {
        let mut stored: HashMap<String, _> = EmbeddingRepo::list_all(self.pool)
            .await?
            .into_iter()
            .map(|e| (e.scene_id.clone(), e))
            .collect();

        let mut vectors = HashMap::with_capacity(scenes.len());
        let mut computed = 0usize;

        for scene in scenes {
            let vector = match stored.remove(&scene.id) {
                Some(embedding) if embedding.is_current(&scene.content_hash) => embedding.vector,
                _ => {
                    let text = to_plain_text(&scene.content);
                    let vector = self.model.embed(&text).await?;
                    EmbeddingRepo::upsert(self.pool, &scene.id, &scene.content_hash, &vector)
                        .await?;
                    computed += 1;
                    vector
                }
            };
            vectors.insert(scene.id.clone(), vector);
        }

        if computed > 0 {
            tracing::info!(computed, total = scenes.len(), "Refreshed scene embeddings");
        }
        Ok(vectors)
    }
}
