//! Scene similarity and theme-consistency scoring.
//!
//! Works on embedding vectors produced by the language model. No model
//! or database access here, only the vector math and ranking rules.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Threshold / limit constants
// ---------------------------------------------------------------------------

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.50;
pub const MIN_SIMILARITY_THRESHOLD: f64 = -1.00;
pub const MAX_SIMILARITY_THRESHOLD: f64 = 1.00;

pub const DEFAULT_SIMILAR_LIMIT: usize = 5;
pub const MAX_SIMILAR_LIMIT: usize = 100;

/// Theme score reported when there is nothing to compare against.
pub const SOLE_SCENE_THEME_SCORE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Style analysis mode
// ---------------------------------------------------------------------------

pub const MODE_QUICK: &str = "quick";
pub const MODE_THOROUGH: &str = "thorough";
pub const VALID_MODES: &[&str] = &[MODE_QUICK, MODE_THOROUGH];

/// How much effort the model spends on a style critique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleMode {
    #[default]
    Quick,
    Thorough,
}

impl StyleMode {
    pub fn parse(mode: &str) -> Result<Self, CoreError> {
        match mode {
            MODE_QUICK => Ok(Self::Quick),
            MODE_THOROUGH => Ok(Self::Thorough),
            other => Err(CoreError::Validation(format!(
                "Invalid mode '{other}'. Must be one of: {}",
                VALID_MODES.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => MODE_QUICK,
            Self::Thorough => MODE_THOROUGH,
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback kinds
// ---------------------------------------------------------------------------

pub const FEEDBACK_STYLE: &str = "style";
pub const FEEDBACK_SUMMARY: &str = "summary";
pub const FEEDBACK_TRANSLATION: &str = "translation";
pub const VALID_FEEDBACK_KINDS: &[&str] = &[FEEDBACK_STYLE, FEEDBACK_SUMMARY, FEEDBACK_TRANSLATION];

/// What a stored piece of model feedback is about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Editorial critique of language, flow and style.
    #[default]
    Style,
    /// Structured summary: events, character development, details, style.
    Summary,
    /// English translation of the scene.
    Translation,
}

impl FeedbackKind {
    pub fn parse(kind: &str) -> Result<Self, CoreError> {
        match kind {
            FEEDBACK_STYLE => Ok(Self::Style),
            FEEDBACK_SUMMARY => Ok(Self::Summary),
            FEEDBACK_TRANSLATION => Ok(Self::Translation),
            other => Err(CoreError::Validation(format!(
                "Invalid feedback type '{other}'. Must be one of: {}",
                VALID_FEEDBACK_KINDS.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Style => FEEDBACK_STYLE,
            Self::Summary => FEEDBACK_SUMMARY,
            Self::Translation => FEEDBACK_TRANSLATION,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Ranking knobs for similar-scene lookup.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    /// Scenes below this cosine similarity are never reported.
    pub similarity_threshold: f64,
    /// Maximum number of similar scenes returned.
    pub similar_limit: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            similar_limit: DEFAULT_SIMILAR_LIMIT,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_threshold(self.similarity_threshold)?;
        validate_limit(self.similar_limit)
    }
}

/// Validate that `threshold` is within `[MIN, MAX]`.
pub fn validate_threshold(threshold: f64) -> Result<(), CoreError> {
    if !(MIN_SIMILARITY_THRESHOLD..=MAX_SIMILARITY_THRESHOLD).contains(&threshold) {
        return Err(CoreError::Validation(format!(
            "Similarity threshold must be between {MIN_SIMILARITY_THRESHOLD} and \
             {MAX_SIMILARITY_THRESHOLD} (got {threshold})"
        )));
    }
    Ok(())
}

/// Validate the similar-scene limit: `1..=MAX_SIMILAR_LIMIT`.
pub fn validate_limit(limit: usize) -> Result<(), CoreError> {
    if limit == 0 || limit > MAX_SIMILAR_LIMIT {
        return Err(CoreError::Validation(format!(
            "Similar scene limit must be between 1 and {MAX_SIMILAR_LIMIT} (got {limit})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Vector math
// ---------------------------------------------------------------------------

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`. Returns `0.0` if vectors have different
/// lengths, are empty, or either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // Non-finite components (e.g. an overflowing model value) poison the
    // whole product.
    let cos = dot / (norm_a * norm_b);
    if !cos.is_finite() {
        return 0.0;
    }
    cos.clamp(-1.0, 1.0)
}

/// Mean of the given vectors. Vectors whose length differs from the first
/// one are skipped. Returns `None` for an empty input.
pub fn centroid<'a, I>(vectors: I) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut iter = vectors.into_iter();
    let first = iter.next()?;
    let mut sum: Vec<f64> = first.iter().map(|x| *x as f64).collect();
    let mut count = 1usize;

    for v in iter {
        if v.len() != sum.len() {
            continue;
        }
        for (acc, x) in sum.iter_mut().zip(v) {
            *acc += *x as f64;
        }
        count += 1;
    }

    Some(sum.into_iter().map(|s| (s / count as f64) as f32).collect())
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// A candidate scene with its embedding.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub id: &'a str,
    pub embedding: &'a [f32],
}

/// A scene ranked by similarity to the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredScene {
    pub id: String,
    pub similarity: f64,
}

/// Rank `candidates` by cosine similarity to `target`.
///
/// The target id itself is excluded. Results are sorted by similarity
/// descending, ties broken by id ascending, filtered by the threshold and
/// truncated to the limit.
pub fn rank_similar(
    target_id: &str,
    target: &[f32],
    candidates: &[Candidate<'_>],
    settings: &AnalysisSettings,
) -> Vec<ScoredScene> {
    let mut scored: Vec<ScoredScene> = candidates
        .iter()
        .filter(|c| c.id != target_id)
        .map(|c| ScoredScene {
            id: c.id.to_string(),
            similarity: cosine_similarity(target, c.embedding),
        })
        .filter(|s| s.similarity >= settings.similarity_threshold)
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(settings.similar_limit);
    scored
}

/// Score how well `target` matches the theme of the other scenes.
///
/// The theme is the centroid of every candidate except the target. The
/// cosine similarity to that centroid is mapped from `[-1, 1]` onto
/// `[0, 1]`. With no other scenes, or a degenerate centroid, the scene is
/// trivially consistent and scores [`SOLE_SCENE_THEME_SCORE`].
pub fn theme_consistency(target_id: &str, target: &[f32], candidates: &[Candidate<'_>]) -> f64 {
    let theme = centroid(
        candidates
            .iter()
            .filter(|c| c.id != target_id && c.embedding.len() == target.len())
            .map(|c| c.embedding),
    );

    let Some(theme) = theme else {
        return SOLE_SCENE_THEME_SCORE;
    };
    if theme.iter().all(|x| *x == 0.0) {
        return SOLE_SCENE_THEME_SCORE;
    }

    let cos = cosine_similarity(target, &theme);
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}
