//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&SqlitePool` as the first argument.

pub mod embedding_repo;
pub mod feedback_repo;
pub mod scene_repo;

pub use embedding_repo::EmbeddingRepo;
pub use feedback_repo::FeedbackRepo;
pub use scene_repo::SceneRepo;
