//! The [`LanguageModel`] seam between the service and its model server.

use aieditor_core::analysis::StyleMode;
use async_trait::async_trait;
use serde::Serialize;

use crate::error::LlmError;

/// Model server readiness as reported by its health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendHealth {
    /// Weights are loaded, requests will be served.
    Ready,
    /// The server is up but still loading the model.
    Loading,
}

/// Sampling parameters for a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    /// Maximum number of tokens to generate.
    pub n_predict: u32,
}

impl CompletionParams {
    /// Short, cheap critique.
    pub const QUICK: Self = Self {
        temperature: 0.7,
        top_k: 30,
        top_p: 0.8,
        n_predict: 256,
    };

    /// Longer critique with wider sampling.
    pub const THOROUGH: Self = Self {
        temperature: 0.7,
        top_k: 50,
        top_p: 0.9,
        n_predict: 512,
    };

    /// Low temperature so the model sticks to the requested JSON shape.
    pub const SUMMARY: Self = Self {
        temperature: 0.3,
        top_k: 30,
        top_p: 0.8,
        n_predict: 512,
    };

    /// Room for a full scene in the target language.
    pub const TRANSLATION: Self = Self {
        temperature: 0.5,
        top_k: 30,
        top_p: 0.8,
        n_predict: 1024,
    };

    pub fn for_mode(mode: StyleMode) -> Self {
        match mode {
            StyleMode::Quick => Self::QUICK,
            StyleMode::Thorough => Self::THOROUGH,
        }
    }
}

/// Operations the analysis service needs from a language model.
///
/// Implemented by [`crate::LlamaCppClient`] in production and by
/// in-process fakes in tests.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Ask the server whether the model is loaded.
    async fn health(&self) -> Result<BackendHealth, LlmError>;

    /// Embed `text` into a fixed-size vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    /// Generate a completion for `prompt`.
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, LlmError>;
}
