//! Embedding client trait and OpenAI-style HTTP implementation

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::EmbeddingConfig;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Embedding request failed: {0}")]
    RequestError(String),

    #[error("Embedding response could not be parsed: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Trait for embedding providers
///
/// Callers must never submit empty or whitespace-only text; the
/// implementations reject it locally rather than burning a network call.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate an embedding vector for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// OpenAI embeddings API client
pub struct OpenAiEmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::InvalidInput(
                "Cannot embed empty text".to_string(),
            ));
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbedError::RequestError(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmbedError::RequestError(e.to_string()))?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::MalformedResponse(e.to_string()))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                EmbedError::MalformedResponse("response contained no embeddings".to_string())
            })?;

        if vector.is_empty() {
            return Err(EmbedError::MalformedResponse(
                "embedding vector is empty".to_string(),
            ));
        }

        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
