//! Query rewriting and compound-question decomposition
//!
//! The transform step depends on a generative model whose single- vs
//! multi-topic judgment is inherently fuzzy, so it sits behind the narrow
//! [`QueryTransformer`] trait and tests inject deterministic fakes.

mod llm;

pub use llm::OpenAiTransformer;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Transform request failed: {0}")]
    RequestError(String),

    #[error("Transform response could not be parsed: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result of rewriting (and possibly decomposing) a raw question
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Question exactly as the user asked it
    pub raw: String,

    /// Search-optimized rewrite, always non-empty
    pub rewritten: String,

    /// Focused sub-queries for compound questions; empty for
    /// single-topic questions. Order carries no ranking meaning.
    pub sub_queries: Vec<String>,

    /// Model's explanation of the split, kept for diagnostics only
    pub reasoning: Option<String>,
}

impl QueryPlan {
    /// Plan that passes the raw question through untouched
    pub fn passthrough(question: &str) -> Self {
        Self {
            raw: question.to_string(),
            rewritten: question.to_string(),
            sub_queries: Vec::new(),
            reasoning: None,
        }
    }

    /// The query list the retrieval stage should run: the sub-queries,
    /// or the rewritten question alone when no decomposition happened
    pub fn queries(&self) -> Vec<String> {
        if self.sub_queries.is_empty() {
            vec![self.rewritten.clone()]
        } else {
            self.sub_queries.clone()
        }
    }

    pub fn is_single_topic(&self) -> bool {
        self.sub_queries.is_empty()
    }
}

/// Wire format returned by the rewriting model
#[derive(Debug, Deserialize)]
pub(crate) struct TransformPayload {
    pub rewritten_query: String,
    #[serde(default)]
    pub sub_queries: Option<Vec<String>>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl TransformPayload {
    /// Validate and normalize the model output into a [`QueryPlan`]
    ///
    /// Blank sub-queries are dropped; a list that ends up empty means the
    /// question is single-topic.
    pub fn into_plan(self, raw: &str) -> Result<QueryPlan, TransformError> {
        let rewritten = self.rewritten_query.trim().to_string();
        if rewritten.is_empty() {
            return Err(TransformError::MalformedResponse(
                "rewritten_query is empty".to_string(),
            ));
        }

        let sub_queries: Vec<String> = self
            .sub_queries
            .unwrap_or_default()
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        Ok(QueryPlan {
            raw: raw.to_string(),
            rewritten,
            sub_queries,
            reasoning: self.reasoning,
        })
    }
}

/// Trait for query rewriting/decomposition backends
#[async_trait]
pub trait QueryTransformer: Send + Sync {
    /// Rewrite the question for retrieval and split it into sub-queries
    /// if it covers more than one topic
    async fn transform(&self, question: &str) -> Result<QueryPlan, TransformError>;
}
