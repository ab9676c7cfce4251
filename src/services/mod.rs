//! Clients for the remote scoring services the pipeline depends on
//!
//! Embedding, nearest-neighbor search, and reranking are all opaque
//! network services. Each one is modeled as a narrow async trait so the
//! pipeline can be driven by deterministic fakes in tests.

mod embedding;
mod reranker;
mod vector;

pub use embedding::{EmbedError, EmbeddingClient, OpenAiEmbeddingClient};
pub use reranker::{
    HttpRerankClient, RerankClient, RerankError, RerankRequest, RerankResponse, RerankResult,
};
pub use vector::{QdrantVectorStore, ScoredPoint, VectorSearchError, VectorStore};
