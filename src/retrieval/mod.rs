//! Concurrent multi-query retrieval with deduplication
//!
//! One question may fan out into several sub-queries; each gets its own
//! embedding, its own vector search, and its own deduplicated,
//! score-sorted candidate list.

mod dedup;
mod fanout;

pub use dedup::{dedup_candidates, merge_candidate_sets};
pub use fanout::FanOutRetriever;

/// One retrieved passage, request-scoped
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Opaque unique key from the vector index
    pub id: String,

    /// Passage text
    pub text: String,

    /// Similarity score from the index, higher is better
    pub raw_score: f32,

    /// Which corpus the passage came from
    pub source_tag: String,

    /// The (sub-)query whose search retrieved this passage
    pub origin_query: String,
}

/// Candidates retrieved for one query, sorted non-increasing by
/// `raw_score` with no duplicate ids
#[derive(Debug, Clone)]
pub struct QueryCandidates {
    pub query: String,
    pub candidates: Vec<Candidate>,
}

impl QueryCandidates {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
