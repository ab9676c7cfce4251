//! Reranking service client
//!
//! The reranker is a soft dependency: every caller is expected to fall
//! back to raw-score ordering when a call fails, so errors here never
//! abort a request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RerankerConfig;

#[derive(Error, Debug)]
pub enum RerankError {
    #[error("Rerank request failed: {0}")]
    RequestError(String),

    #[error("Rerank response could not be parsed: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Request body for the reranking service
#[derive(Debug, Serialize)]
pub struct RerankRequest {
    pub query: String,
    pub documents: Vec<String>,
    pub top_k: usize,
    pub return_documents: bool,
}

/// One reranked document
///
/// `index` is the position in the submitted `documents` array; the caller
/// maps it back to its own candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankResult {
    pub index: usize,
    pub score: f32,
    #[serde(default)]
    pub document: Option<String>,
}

/// Response from the reranking service
#[derive(Debug, Deserialize)]
pub struct RerankResponse {
    pub results: Vec<RerankResult>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub total_documents: usize,
}

/// Trait for reranking backends
#[async_trait]
pub trait RerankClient: Send + Sync {
    /// Score `documents` against `query` and return the best `top_k` in
    /// the service's ranked order
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<RerankResponse, RerankError>;
}

/// HTTP client for a cross-encoder reranking endpoint
pub struct HttpRerankClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRerankClient {
    pub fn new(config: &RerankerConfig) -> Result<Self, RerankError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RerankError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl RerankClient for HttpRerankClient {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<RerankResponse, RerankError> {
        if query.is_empty() {
            return Err(RerankError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }
        if documents.is_empty() {
            return Ok(RerankResponse {
                results: Vec::new(),
                query: query.to_string(),
                total_documents: 0,
            });
        }

        let request = RerankRequest {
            query: query.to_string(),
            documents: documents.to_vec(),
            top_k,
            return_documents: true,
        };

        tracing::debug!(
            documents = documents.len(),
            top_k,
            "calling reranking service"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RerankError::RequestError(e.to_string()))?
            .error_for_status()
            .map_err(|e| RerankError::RequestError(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| RerankError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserializes_without_documents() {
        let json = r#"{"results": [{"index": 2, "score": 0.91}], "query": "q", "total_documents": 3}"#;
        let response: RerankResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].index, 2);
        assert!(response.results[0].document.is_none());
    }

    #[test]
    fn test_request_serializes_expected_fields() {
        let request = RerankRequest {
            query: "export procedure".to_string(),
            documents: vec!["doc a".to_string()],
            top_k: 5,
            return_documents: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["top_k"], 5);
        assert_eq!(value["return_documents"], true);
        assert_eq!(value["documents"].as_array().unwrap().len(), 1);
    }
}
