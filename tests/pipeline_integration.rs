//! End-to-end pipeline tests with deterministic fake services

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tradesearch::error::TradeSearchError;
use tradesearch::pipeline::{SearchOptions, SearchOutcome, SearchPipeline};
use tradesearch::rerank::{RerankAllocator, RerankStrategy};
use tradesearch::retrieval::FanOutRetriever;
use tradesearch::services::{
    EmbedError, EmbeddingClient, RerankClient, RerankError, RerankResponse, RerankResult,
    ScoredPoint, VectorSearchError, VectorStore,
};
use tradesearch::transform::{QueryPlan, QueryTransformer, TransformError};

/// Transformer returning a canned plan, or failing when none is set
struct FakeTransformer {
    plan: Option<QueryPlan>,
}

impl FakeTransformer {
    fn single_topic(rewritten: &str) -> Self {
        Self {
            plan: Some(QueryPlan {
                raw: rewritten.to_string(),
                rewritten: rewritten.to_string(),
                sub_queries: Vec::new(),
                reasoning: None,
            }),
        }
    }

    fn compound(rewritten: &str, sub_queries: &[&str]) -> Self {
        Self {
            plan: Some(QueryPlan {
                raw: rewritten.to_string(),
                rewritten: rewritten.to_string(),
                sub_queries: sub_queries.iter().map(|s| s.to_string()).collect(),
                reasoning: None,
            }),
        }
    }

    fn unreachable_model() -> Self {
        Self { plan: None }
    }
}

#[async_trait]
impl QueryTransformer for FakeTransformer {
    async fn transform(&self, _question: &str) -> Result<QueryPlan, TransformError> {
        self.plan
            .clone()
            .ok_or_else(|| TransformError::RequestError("model unreachable".to_string()))
    }
}

/// Embedder that encodes each known query as a one-hot key vector and
/// records every call
struct KeyedEmbedder {
    keys: HashMap<String, f32>,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl EmbeddingClient for KeyedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.calls.lock().unwrap().push(text.to_string());
        let key = self.keys.get(text).copied().unwrap_or(-1.0);
        Ok(vec![key])
    }

    fn model_name(&self) -> &str {
        "keyed-fake"
    }
}

/// Store that answers each key vector with its canned candidate list
struct KeyedStore {
    corpus: HashMap<i64, Vec<ScoredPoint>>,
}

#[async_trait]
impl VectorStore for KeyedStore {
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorSearchError> {
        let key = vector[0] as i64;
        Ok(self
            .corpus
            .get(&key)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .collect())
    }
}

/// Reranker that returns submission order with fresh scores
struct IdentityReranker;

#[async_trait]
impl RerankClient for IdentityReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<RerankResponse, RerankError> {
        let results = (0..documents.len().min(top_k))
            .map(|index| RerankResult {
                index,
                score: 0.95 - index as f32 * 0.05,
                document: None,
            })
            .collect();
        Ok(RerankResponse {
            results,
            query: query.to_string(),
            total_documents: documents.len(),
        })
    }
}

struct DownReranker;

#[async_trait]
impl RerankClient for DownReranker {
    async fn rerank(
        &self,
        _query: &str,
        _documents: &[String],
        _top_k: usize,
    ) -> Result<RerankResponse, RerankError> {
        Err(RerankError::RequestError("connection refused".to_string()))
    }
}

fn points(prefix: &str, count: usize) -> Vec<ScoredPoint> {
    (0..count)
        .map(|i| ScoredPoint {
            id: format!("{prefix}-{i}"),
            score: 0.95 - i as f32 * 0.05,
            text: format!("passage {prefix}-{i}"),
            source_tag: "corpus".to_string(),
        })
        .collect()
}

/// Wires a pipeline over canned per-query corpora
fn build_pipeline(
    transformer: FakeTransformer,
    corpora: Vec<(&str, Vec<ScoredPoint>)>,
    reranker: Option<Arc<dyn RerankClient>>,
) -> (SearchPipeline, Arc<KeyedEmbedder>) {
    let mut keys = HashMap::new();
    let mut corpus = HashMap::new();
    for (i, (query, candidates)) in corpora.into_iter().enumerate() {
        keys.insert(query.to_string(), i as f32);
        corpus.insert(i as i64, candidates);
    }

    let embedder = Arc::new(KeyedEmbedder {
        keys,
        calls: Mutex::new(Vec::new()),
    });
    let retriever = FanOutRetriever::new(
        Arc::clone(&embedder) as Arc<dyn EmbeddingClient>,
        Arc::new(KeyedStore { corpus }),
    );

    let pipeline = SearchPipeline::new(
        Arc::new(transformer),
        retriever,
        RerankAllocator::new(reranker),
    );
    (pipeline, embedder)
}

fn options(total_k: usize, strategy: RerankStrategy) -> SearchOptions {
    SearchOptions {
        fetch_limit: 25,
        total_k,
        strategy,
        raw_question_fallback: false,
    }
}

#[tokio::test]
async fn single_topic_question_runs_one_query() {
    let (pipeline, embedder) = build_pipeline(
        FakeTransformer::single_topic("incoterm definition"),
        vec![("incoterm definition", points("inc", 5))],
        Some(Arc::new(IdentityReranker)),
    );

    let outcome = pipeline
        .search("What is an incoterm?", &options(10, RerankStrategy::Unified))
        .await
        .unwrap();

    let calls = embedder.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["incoterm definition".to_string()]);

    let SearchOutcome::Found { passages, plan } = outcome else {
        panic!("expected results");
    };
    assert!(plan.is_single_topic());
    assert_eq!(passages.len(), 5);
}

#[tokio::test]
async fn balanced_mode_covers_both_topics_equally() {
    let (pipeline, _) = build_pipeline(
        FakeTransformer::compound(
            "export vs import procedure",
            &["export procedure", "import procedure"],
        ),
        vec![
            ("export procedure", points("exp", 8)),
            ("import procedure", points("imp", 8)),
        ],
        Some(Arc::new(IdentityReranker)),
    );

    let outcome = pipeline
        .search(
            "difference between export and import?",
            &options(10, RerankStrategy::Balanced),
        )
        .await
        .unwrap();

    let SearchOutcome::Found { passages, .. } = outcome else {
        panic!("expected results");
    };
    assert_eq!(passages.len(), 10);
    assert_eq!(
        passages
            .iter()
            .filter(|p| p.origin_query == "export procedure")
            .count(),
        5
    );
    assert_eq!(
        passages
            .iter()
            .filter(|p| p.origin_query == "import procedure")
            .count(),
        5
    );
}

#[tokio::test]
async fn unified_mode_survives_reranker_outage() {
    let (pipeline, _) = build_pipeline(
        FakeTransformer::single_topic("letter of credit requirements"),
        vec![("letter of credit requirements", points("loc", 7))],
        Some(Arc::new(DownReranker)),
    );

    let outcome = pipeline
        .search(
            "What does a letter of credit require?",
            &options(5, RerankStrategy::Unified),
        )
        .await
        .unwrap();

    let SearchOutcome::Found { passages, .. } = outcome else {
        panic!("expected results despite reranker outage");
    };
    assert_eq!(passages.len(), 5);
    for window in passages.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[tokio::test]
async fn empty_retrieval_returns_explicit_no_matches() {
    let (pipeline, _) = build_pipeline(
        FakeTransformer::compound("a vs b", &["topic a", "topic b"]),
        vec![("topic a", Vec::new()), ("topic b", Vec::new())],
        Some(Arc::new(IdentityReranker)),
    );

    let outcome = pipeline
        .search("anything?", &options(10, RerankStrategy::Balanced))
        .await
        .unwrap();

    assert!(matches!(outcome, SearchOutcome::NoMatches { .. }));
    assert!(outcome.passages().is_empty());
}

#[tokio::test]
async fn transform_failure_without_fallback_fails_request() {
    let (pipeline, _) = build_pipeline(
        FakeTransformer::unreachable_model(),
        vec![("whatever", points("w", 3))],
        None,
    );

    let result = pipeline
        .search("question", &options(10, RerankStrategy::Unified))
        .await;

    assert!(matches!(result, Err(TradeSearchError::Transformation(_))));
}

#[tokio::test]
async fn transform_failure_with_fallback_uses_raw_question() {
    let (pipeline, embedder) = build_pipeline(
        FakeTransformer::unreachable_model(),
        vec![("what is demurrage?", points("dem", 4))],
        None,
    );

    let mut opts = options(10, RerankStrategy::Unified);
    opts.raw_question_fallback = true;

    let outcome = pipeline.search("what is demurrage?", &opts).await.unwrap();

    let calls = embedder.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["what is demurrage?".to_string()]);

    let SearchOutcome::Found { passages, plan } = outcome else {
        panic!("expected results via fallback");
    };
    assert_eq!(plan.rewritten, "what is demurrage?");
    assert_eq!(passages.len(), 4);
}

#[tokio::test]
async fn empty_question_is_invalid_request() {
    let (pipeline, _) = build_pipeline(
        FakeTransformer::single_topic("x"),
        vec![("x", points("x", 1))],
        None,
    );

    let result = pipeline
        .search("   ", &options(10, RerankStrategy::Unified))
        .await;

    assert!(matches!(result, Err(TradeSearchError::InvalidRequest(_))));
}

#[tokio::test]
async fn zero_budget_is_invalid_request() {
    let (pipeline, _) = build_pipeline(
        FakeTransformer::single_topic("x"),
        vec![("x", points("x", 1))],
        None,
    );

    let result = pipeline
        .search("question", &options(0, RerankStrategy::Unified))
        .await;

    assert!(matches!(result, Err(TradeSearchError::InvalidRequest(_))));
}
