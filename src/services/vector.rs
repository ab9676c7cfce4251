//! Vector index client trait and Qdrant HTTP implementation

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::VectorStoreConfig;

#[derive(Error, Debug)]
pub enum VectorSearchError {
    #[error("Vector search request failed: {0}")]
    RequestError(String),

    #[error("Vector search response could not be parsed: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// One nearest-neighbor hit from the index
///
/// The index gives no cross-call uniqueness guarantee (replica skew can
/// return the same id twice); deduplication is the caller's job.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    /// Opaque point id, normalized to its string form
    pub id: String,
    /// Similarity score, higher is more similar
    pub score: f32,
    /// Passage text
    pub text: String,
    /// Where the passage came from ("unknown" when the payload omits it)
    pub source_tag: String,
}

/// Trait for nearest-neighbor search backends
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `limit` nearest neighbors of `vector`
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorSearchError>;
}

/// Qdrant HTTP client using the `points/query` API
pub struct QdrantVectorStore {
    client: reqwest::Client,
    url: String,
    collection: String,
    api_key: Option<String>,
}

impl QdrantVectorStore {
    pub fn new(config: &VectorStoreConfig, api_key: Option<String>) -> Result<Self, VectorSearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorSearchError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Value,
}

impl RawPoint {
    /// Map a raw point onto [`ScoredPoint`], tolerating the two payload
    /// text keys the ingestion side has used over time
    fn into_scored(self) -> ScoredPoint {
        let text = self
            .payload
            .get("text")
            .or_else(|| self.payload.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let source_tag = self
            .payload
            .get("data_source")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        // Point ids may be integers or UUID strings
        let id = match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        ScoredPoint {
            id,
            score: self.score,
            text,
            source_tag,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorSearchError> {
        if vector.is_empty() {
            return Err(VectorSearchError::InvalidInput(
                "Query vector is empty".to_string(),
            ));
        }
        if limit == 0 {
            return Err(VectorSearchError::InvalidInput(
                "Limit must be positive".to_string(),
            ));
        }

        let endpoint = format!("{}/collections/{}/points/query", self.url, self.collection);
        let body = serde_json::json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
        });

        let mut request = self.client.post(&endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VectorSearchError::RequestError(e.to_string()))?
            .error_for_status()
            .map_err(|e| VectorSearchError::RequestError(e.to_string()))?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorSearchError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .result
            .points
            .into_iter()
            .map(RawPoint::into_scored)
            .collect())
    }
}
