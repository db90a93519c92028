//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` input DTO where the entity is written by clients

pub mod embedding;
pub mod feedback;
pub mod scene;
