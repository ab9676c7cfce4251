//! Budgeted reranking of retrieved candidates

mod allocator;

pub use allocator::RerankAllocator;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TradeSearchError};
use crate::retrieval::Candidate;

/// How the shared result budget is spent across sub-queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerankStrategy {
    /// Merge all candidate sets and rerank once against the rewritten
    /// query. Best overall relevance; a weak topic can be crowded out.
    Unified,
    /// Rerank each sub-query's candidates separately and give every
    /// query an equal share of the budget. Guarantees topical coverage.
    Balanced,
}

impl std::str::FromStr for RerankStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unified" => Ok(Self::Unified),
            "balanced" => Ok(Self::Balanced),
            other => Err(format!("unknown strategy '{other}', expected 'unified' or 'balanced'")),
        }
    }
}

/// Result budget for one request
#[derive(Debug, Clone, Copy)]
pub struct SearchBudget {
    /// Total number of passages handed to the answer agent
    pub total_k: usize,
    pub strategy: RerankStrategy,
}

impl SearchBudget {
    pub fn new(total_k: usize, strategy: RerankStrategy) -> Result<Self> {
        if total_k == 0 {
            return Err(TradeSearchError::InvalidRequest(
                "Result budget must be positive".to_string(),
            ));
        }
        Ok(Self { total_k, strategy })
    }

    /// Equal share of the budget per query, never below one
    pub fn per_query_k(&self, num_queries: usize) -> usize {
        debug_assert!(num_queries > 0);
        (self.total_k / num_queries).max(1)
    }
}

/// One passage selected for the answer agent
///
/// In Balanced mode each sub-query's scores come from an independent
/// rerank call; they are locally normalized relevance judgments and are
/// not comparable across queries, so [`RankedPassage`] lists are never
/// globally re-sorted by score.
#[derive(Debug, Clone)]
pub struct RankedPassage {
    pub candidate: Candidate,
    /// Rerank score, or the raw similarity score on fallback
    pub score: f32,
    pub origin_query: String,
}
