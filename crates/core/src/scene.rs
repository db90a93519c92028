//! Scene identity, metadata validation and revision-status constants.
//!
//! A scene is addressed by an opaque id chosen by the editor. The id is
//! only required to be a usable URL path segment; no further structure is
//! assumed.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a scene id in bytes.
pub const MAX_SCENE_ID_LENGTH: usize = 128;

/// Maximum length of a scene title in characters.
pub const MAX_TITLE_LENGTH: usize = 300;

/// Maximum length of the `revision` marker in characters.
pub const MAX_REVISION_LENGTH: usize = 64;

/// Maximum scene content size in bytes (5 MiB).
pub const MAX_CONTENT_BYTES: usize = 5 * 1024 * 1024;

/// Gap between consecutive scene positions inside a chapter.
pub const POSITION_STEP: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Revision status
// ---------------------------------------------------------------------------

/// Freshly created scene, never analyzed.
pub const STATUS_UNREVIEWED: &str = "unreviewed";
/// Content changed since the last AI pass.
pub const STATUS_UNPROCESSED: &str = "unprocessed";
/// Style feedback stored for the current content.
pub const STATUS_AI_PROCESSED: &str = "ai_processed";

/// Whether a scene in `status` still needs a style pass.
pub fn needs_review(status: &str) -> bool {
    status != STATUS_AI_PROCESSED
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a scene id taken from the URL path.
///
/// Must be non-blank, at most [`MAX_SCENE_ID_LENGTH`] bytes, and free of
/// `/` and control characters.
pub fn validate_scene_id(id: &str) -> Result<(), CoreError> {
    if id.trim().is_empty() {
        return Err(CoreError::Validation(
            "Scene id must not be empty".to_string(),
        ));
    }
    if id.len() > MAX_SCENE_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "Scene id exceeds maximum length of {MAX_SCENE_ID_LENGTH} bytes (got {})",
            id.len()
        )));
    }
    if id.chars().any(|c| c == '/' || c.is_control()) {
        return Err(CoreError::Validation(
            "Scene id must not contain '/' or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate the chapter number: must be non-negative.
pub fn validate_chapter(chapter: i64) -> Result<(), CoreError> {
    if chapter < 0 {
        return Err(CoreError::Validation(format!(
            "Chapter must be a non-negative integer (got {chapter})"
        )));
    }
    Ok(())
}

/// Validate the revision marker: non-blank and within length limit.
///
/// The marker is usually a date stamp (`2024-06-01`) but is not parsed.
pub fn validate_revision(revision: &str) -> Result<(), CoreError> {
    if revision.trim().is_empty() {
        return Err(CoreError::Validation(
            "Revision must not be empty".to_string(),
        ));
    }
    if revision.chars().count() > MAX_REVISION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Revision exceeds maximum length of {MAX_REVISION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate an optional title: length check only.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate scene content: may be empty, bounded in size.
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.len() > MAX_CONTENT_BYTES {
        return Err(CoreError::Validation(format!(
            "Content exceeds maximum size of {MAX_CONTENT_BYTES} bytes (got {})",
            content.len()
        )));
    }
    Ok(())
}
