//! Two-stage scatter/gather retrieval across sub-queries

use std::sync::Arc;

use futures::future;

use crate::error::{Result, TradeSearchError};
use crate::retrieval::{dedup_candidates, Candidate, QueryCandidates};
use crate::services::{EmbeddingClient, VectorStore};

/// Concurrent multi-query retriever
///
/// Stage 1 embeds every query concurrently; stage 2 starts only after all
/// embeddings resolved, then runs every vector search concurrently. The
/// barrier between the stages bounds peak concurrency at one in-flight
/// call per query.
///
/// A failure in one query's embedding or search never aborts its
/// siblings: that query just contributes an empty candidate list.
pub struct FanOutRetriever {
    embeddings: Arc<dyn EmbeddingClient>,
    vectors: Arc<dyn VectorStore>,
}

impl FanOutRetriever {
    pub fn new(embeddings: Arc<dyn EmbeddingClient>, vectors: Arc<dyn VectorStore>) -> Self {
        Self {
            embeddings,
            vectors,
        }
    }

    /// Retrieve up to `limit` candidates per query
    ///
    /// Returns one [`QueryCandidates`] per usable query, in input order,
    /// each sorted non-increasing by score and deduplicated by id.
    pub async fn retrieve(&self, queries: &[String], limit: usize) -> Result<Vec<QueryCandidates>> {
        let queries: Vec<&String> = queries.iter().filter(|q| !q.trim().is_empty()).collect();

        if queries.is_empty() {
            return Err(TradeSearchError::InvalidRequest(
                "No usable queries to retrieve for".to_string(),
            ));
        }
        if limit == 0 {
            return Err(TradeSearchError::InvalidRequest(
                "Retrieval limit must be positive".to_string(),
            ));
        }

        tracing::debug!(queries = queries.len(), limit, "starting fan-out retrieval");

        // Stage 1: embed every query concurrently
        let embed_futures = queries.iter().map(|q| self.embeddings.embed(q));
        let embeddings = future::join_all(embed_futures).await;

        let embeddings: Vec<Option<Vec<f32>>> = queries
            .iter()
            .zip(embeddings)
            .map(|(query, result)| match result {
                Ok(vector) => Some(vector),
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "embedding failed, query dropped from batch");
                    None
                }
            })
            .collect();

        // Stage 2: search the index concurrently with every embedding
        let search_futures = queries.iter().zip(&embeddings).map(|(query, embedding)| {
            let vectors = Arc::clone(&self.vectors);
            async move {
                let Some(vector) = embedding else {
                    return Vec::new();
                };
                match vectors.search(vector, limit).await {
                    Ok(points) => points,
                    Err(e) => {
                        tracing::warn!(query = %query, error = %e, "vector search failed, query dropped from batch");
                        Vec::new()
                    }
                }
            }
        });
        let search_results = future::join_all(search_futures).await;

        // Group, sort, and dedup per query
        let grouped: Vec<QueryCandidates> = queries
            .into_iter()
            .zip(search_results)
            .map(|(query, points)| {
                let candidates: Vec<Candidate> = points
                    .into_iter()
                    .map(|p| Candidate {
                        id: p.id,
                        text: p.text,
                        raw_score: p.score,
                        source_tag: p.source_tag,
                        origin_query: query.clone(),
                    })
                    .collect();

                let candidates = dedup_candidates(candidates);
                tracing::debug!(query = %query, candidates = candidates.len(), "query retrieval complete");

                QueryCandidates {
                    query: query.clone(),
                    candidates,
                }
            })
            .collect();

        let total: usize = grouped.iter().map(|g| g.candidates.len()).sum();
        tracing::info!(
            queries = grouped.len(),
            candidates = total,
            "fan-out retrieval complete"
        );

        Ok(grouped)
    }
}
