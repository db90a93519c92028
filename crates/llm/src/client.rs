//! HTTP client for a llama.cpp-compatible model server.
//!
//! Wraps the server's REST endpoints (`/health`, `/embedding`,
//! `/completion`) using [`reqwest`].

use std::time::{Duration, Instant};

use aieditor_core::analysis::centroid;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::LlmError;
use crate::model::{BackendHealth, CompletionParams, LanguageModel};

/// HTTP client for a single model server.
pub struct LlamaCppClient {
    client: reqwest::Client,
    base_url: String,
}

/// Response of `POST /completion`.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    content: String,
}

/// Response of `POST /embedding`.
///
/// Older servers return a single object, newer ones an array with one
/// entry per input, and the OpenAI-compatible route wraps entries in
/// `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Single { embedding: EmbeddingValue },
    Batch(Vec<EmbeddingItem>),
    OpenAi { data: Vec<EmbeddingItem> },
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: EmbeddingValue,
}

/// A pooled vector, or one vector per token when the server runs without
/// pooling.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingValue {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

impl EmbeddingValue {
    /// Collapse to a single vector, mean-pooling per-token output.
    fn into_vector(self) -> Result<Vec<f32>, LlmError> {
        match self {
            Self::Flat(v) => Ok(v),
            Self::Nested(mut rows) if rows.len() == 1 => Ok(rows.swap_remove(0)),
            Self::Nested(rows) => centroid(rows.iter().map(Vec::as_slice))
                .ok_or_else(|| LlmError::Decode("empty embedding".to_string())),
        }
    }
}

impl EmbeddingResponse {
    fn into_vector(self) -> Result<Vec<f32>, LlmError> {
        let value = match self {
            Self::Single { embedding } => embedding,
            Self::Batch(items) | Self::OpenAi { data: items } => items
                .into_iter()
                .next()
                .ok_or_else(|| LlmError::Decode("no embedding in response".to_string()))?
                .embedding,
        };
        value.into_vector()
    }
}

impl LlamaCppClient {
    /// Create a client for the server at `base_url`, e.g.
    /// `http://127.0.0.1:9070`, with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or turn it into
    /// [`LlmError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, LlmError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| LlmError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LanguageModel for LlamaCppClient {
    /// `GET /health`: 200 once the model is loaded, 503 while loading.
    async fn health(&self) -> Result<BackendHealth, LlmError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(BackendHealth::Loading);
        }
        Self::ensure_success(response).await?;
        Ok(BackendHealth::Ready)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let body = serde_json::json!({ "content": text });

        let response = self
            .client
            .post(format!("{}/embedding", self.base_url))
            .json(&body)
            .send()
            .await?;

        let parsed: EmbeddingResponse = Self::parse_json(response).await?;
        parsed.into_vector()
    }

    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, LlmError> {
        let mut body = serde_json::to_value(params).map_err(|e| LlmError::Decode(e.to_string()))?;
        body["prompt"] = serde_json::Value::String(prompt.to_string());

        let preview: String = prompt.chars().take(100).collect();
        tracing::debug!(prompt = %preview, n_predict = params.n_predict, "Sending completion request");
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .json(&body)
            .send()
            .await?;

        let parsed: CompletionResponse = Self::parse_json(response).await?;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Completion request finished",
        );
        Ok(parsed.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<f32>, LlmError> {
        serde_json::from_str::<EmbeddingResponse>(json)
            .map_err(|e| LlmError::Decode(e.to_string()))?
            .into_vector()
    }

    #[test]
    fn legacy_single_object() {
        assert_eq!(parse(r#"{"embedding":[0.5,1.0]}"#).unwrap(), vec![0.5, 1.0]);
    }

    #[test]
    fn array_of_pooled_items() {
        let json = r#"[{"index":0,"embedding":[[0.25,0.75]]}]"#;
        assert_eq!(parse(json).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn per_token_rows_are_mean_pooled() {
        let json = r#"[{"index":0,"embedding":[[1.0,0.0],[0.0,1.0]]}]"#;
        assert_eq!(parse(json).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn openai_shape() {
        let json = r#"{"object":"list","data":[{"embedding":[2.0,4.0]}]}"#;
        assert_eq!(parse(json).unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn empty_batch_is_an_error() {
        assert!(parse("[]").is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = LlamaCppClient::with_client(reqwest::Client::new(), "http://host:9070/");
        assert_eq!(client.base_url(), "http://host:9070");
    }
}
