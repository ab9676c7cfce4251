//! Strategy selection and budget allocation across sub-queries

use std::sync::Arc;

use futures::future;

use crate::rerank::{RankedPassage, RerankStrategy, SearchBudget};
use crate::retrieval::{merge_candidate_sets, Candidate, QueryCandidates};
use crate::services::{RerankClient, RerankResult};

/// Turns raw candidate sets into a final ranked, budgeted passage list
///
/// The reranking service is a soft dependency: any failure downgrades to
/// raw-score ordering for the affected scope (the whole batch in Unified
/// mode, a single query in Balanced mode). A request never fails solely
/// because reranking is unavailable.
pub struct RerankAllocator {
    reranker: Option<Arc<dyn RerankClient>>,
}

impl RerankAllocator {
    pub fn new(reranker: Option<Arc<dyn RerankClient>>) -> Self {
        Self { reranker }
    }

    /// Select and rank at most `budget.total_k` passages
    pub async fn allocate(
        &self,
        rewritten_query: &str,
        groups: Vec<QueryCandidates>,
        budget: &SearchBudget,
    ) -> Vec<RankedPassage> {
        match budget.strategy {
            RerankStrategy::Unified => self.allocate_unified(rewritten_query, groups, budget).await,
            RerankStrategy::Balanced => self.allocate_balanced(groups, budget).await,
        }
    }

    /// Merge every set into one pool and rerank it once against the
    /// rewritten query
    async fn allocate_unified(
        &self,
        rewritten_query: &str,
        groups: Vec<QueryCandidates>,
        budget: &SearchBudget,
    ) -> Vec<RankedPassage> {
        let merged = merge_candidate_sets(groups.into_iter().map(|g| g.candidates).collect());
        if merged.is_empty() {
            return Vec::new();
        }

        if let Some(reranker) = &self.reranker {
            let documents: Vec<String> = merged.iter().map(|c| c.text.clone()).collect();

            match reranker
                .rerank(rewritten_query, &documents, budget.total_k)
                .await
            {
                Ok(response) => {
                    tracing::debug!(
                        results = response.results.len(),
                        "unified rerank complete"
                    );
                    return map_reranked(&merged, response.results, budget.total_k);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "unified rerank failed, falling back to raw similarity order");
                }
            }
        }

        merged
            .into_iter()
            .take(budget.total_k)
            .map(raw_passage)
            .collect()
    }

    /// Give every sub-query an equal share of the budget, reranking each
    /// set against its own query
    ///
    /// The output is the concatenation of per-query contributions in
    /// query order. It is deliberately not re-sorted globally: each
    /// rerank call normalizes its scores independently, so cross-query
    /// comparisons are meaningless and a global sort would trade the
    /// coverage guarantee for noise.
    async fn allocate_balanced(
        &self,
        groups: Vec<QueryCandidates>,
        budget: &SearchBudget,
    ) -> Vec<RankedPassage> {
        if groups.is_empty() {
            return Vec::new();
        }

        // The split counts every query, including ones that retrieved
        // nothing, so the share does not silently grow on partial failure
        let per_query_k = budget.per_query_k(groups.len());
        tracing::debug!(
            queries = groups.len(),
            per_query_k,
            "balanced rerank starting"
        );

        let tasks = groups
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| self.rank_one_query(group, per_query_k));

        let per_query: Vec<Vec<RankedPassage>> = future::join_all(tasks).await;

        per_query
            .into_iter()
            .flatten()
            .take(budget.total_k)
            .collect()
    }

    /// Rank a single query's candidates, falling back to its raw-score
    /// order if the rerank call fails
    async fn rank_one_query(&self, group: &QueryCandidates, top_k: usize) -> Vec<RankedPassage> {
        if let Some(reranker) = &self.reranker {
            let documents: Vec<String> =
                group.candidates.iter().map(|c| c.text.clone()).collect();

            match reranker.rerank(&group.query, &documents, top_k).await {
                Ok(response) => {
                    return map_reranked(&group.candidates, response.results, top_k);
                }
                Err(e) => {
                    tracing::warn!(
                        query = %group.query,
                        error = %e,
                        "per-query rerank failed, falling back to raw similarity order"
                    );
                }
            }
        }

        group
            .candidates
            .iter()
            .take(top_k)
            .cloned()
            .map(raw_passage)
            .collect()
    }
}

/// Map service result indices back onto the submitted candidates
///
/// Indices refer to positions in the submitted document list; anything
/// out of range is dropped with a warning rather than failing the batch.
fn map_reranked(
    candidates: &[Candidate],
    results: Vec<RerankResult>,
    top_k: usize,
) -> Vec<RankedPassage> {
    results
        .into_iter()
        .filter_map(|result| match candidates.get(result.index) {
            Some(candidate) => Some(RankedPassage {
                candidate: candidate.clone(),
                score: result.score,
                origin_query: candidate.origin_query.clone(),
            }),
            None => {
                tracing::warn!(
                    index = result.index,
                    candidates = candidates.len(),
                    "rerank result index out of range, skipping"
                );
                None
            }
        })
        .take(top_k)
        .collect()
}

fn raw_passage(candidate: Candidate) -> RankedPassage {
    RankedPassage {
        score: candidate.raw_score,
        origin_query: candidate.origin_query.clone(),
        candidate,
    }
}
