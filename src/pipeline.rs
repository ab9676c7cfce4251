//! End-to-end search pipeline
//!
//! plan -> fan-out retrieval -> dedup -> budgeted rerank -> outcome.
//! Everything is request-scoped: options travel down the call chain and
//! no stage keeps mutable state between requests, so concurrent requests
//! with different strategies are independent.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{Result, TradeSearchError};
use crate::rerank::{RankedPassage, RerankAllocator, RerankStrategy, SearchBudget};
use crate::retrieval::FanOutRetriever;
use crate::transform::{QueryPlan, QueryTransformer};

/// Per-request knobs
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Candidates fetched from the index per query
    pub fetch_limit: usize,

    /// Total passages handed to the answer agent
    pub total_k: usize,

    pub strategy: RerankStrategy,

    /// Treat the raw question as the sole query when rewriting fails,
    /// instead of failing the request
    pub raw_question_fallback: bool,
}

impl SearchOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            fetch_limit: config.fetch_limit,
            total_k: config.final_k,
            strategy: config.strategy,
            raw_question_fallback: config.raw_question_fallback,
        }
    }
}

/// Result of one pipeline run
///
/// `NoMatches` is an explicit signal that retrieval ran and found
/// nothing, distinct from a pipeline that was never executed.
#[derive(Debug)]
pub enum SearchOutcome {
    Found {
        passages: Vec<RankedPassage>,
        plan: QueryPlan,
    },
    NoMatches {
        plan: QueryPlan,
    },
}

impl SearchOutcome {
    pub fn plan(&self) -> &QueryPlan {
        match self {
            Self::Found { plan, .. } | Self::NoMatches { plan } => plan,
        }
    }

    pub fn passages(&self) -> &[RankedPassage] {
        match self {
            Self::Found { passages, .. } => passages,
            Self::NoMatches { .. } => &[],
        }
    }
}

/// The retrieval-and-reranking pipeline
pub struct SearchPipeline {
    transformer: Arc<dyn QueryTransformer>,
    retriever: FanOutRetriever,
    allocator: RerankAllocator,
}

impl SearchPipeline {
    pub fn new(
        transformer: Arc<dyn QueryTransformer>,
        retriever: FanOutRetriever,
        allocator: RerankAllocator,
    ) -> Self {
        Self {
            transformer,
            retriever,
            allocator,
        }
    }

    /// Answer-ready passages for one question
    pub async fn search(&self, question: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("search", %request_id);

        self.search_inner(question, options).instrument(span).await
    }

    async fn search_inner(
        &self,
        question: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome> {
        if question.trim().is_empty() {
            return Err(TradeSearchError::InvalidRequest(
                "Question cannot be empty".to_string(),
            ));
        }

        let budget = SearchBudget::new(options.total_k, options.strategy)?;

        let plan = match self.transformer.transform(question).await {
            Ok(plan) => plan,
            Err(e) if options.raw_question_fallback => {
                tracing::warn!(error = %e, "query transform failed, falling back to the raw question");
                QueryPlan::passthrough(question)
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            rewritten = %plan.rewritten,
            sub_queries = plan.sub_queries.len(),
            strategy = ?options.strategy,
            "executing search plan"
        );

        let queries = plan.queries();
        let groups = self
            .retriever
            .retrieve(&queries, options.fetch_limit)
            .await?;

        if groups.iter().all(|g| g.is_empty()) {
            tracing::info!("no candidates found for any query");
            return Ok(SearchOutcome::NoMatches { plan });
        }

        let passages = self
            .allocator
            .allocate(&plan.rewritten, groups, &budget)
            .await;

        if passages.is_empty() {
            return Ok(SearchOutcome::NoMatches { plan });
        }

        tracing::info!(passages = passages.len(), "search complete");
        Ok(SearchOutcome::Found { passages, plan })
    }
}
