//! Domain logic for the AI editor analysis service.
//!
//! Pure functions and types only: no database, no HTTP. Shared by the
//! `db`, `llm` and `api` crates.

pub mod analysis;
pub mod error;
pub mod hashing;
pub mod markup;
pub mod scene;
pub mod types;
