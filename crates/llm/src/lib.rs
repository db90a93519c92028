//! Language-model backend for scene analysis.
//!
//! Talks to a llama.cpp-compatible HTTP server (health, embeddings,
//! completions), tracks whether the model has finished loading, and
//! provides the prompt templates used for critiques, summaries and
//! translations.

pub mod client;
pub mod error;
pub mod gate;
pub mod loader;
pub mod model;
pub mod prompts;
pub mod summary;

pub use client::LlamaCppClient;
pub use error::LlmError;
pub use gate::{BackendGate, BackendState};
pub use model::{BackendHealth, CompletionParams, LanguageModel};
pub use summary::{parse_summary, SceneSummary};
