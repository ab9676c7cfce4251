//! Tradesearch - Retrieval pipeline for trade-document Q&A
//!
//! Answers natural-language questions over a trade-document corpus by
//! rewriting (and, for compound questions, decomposing) the query,
//! fanning out concurrent vector searches, deduplicating candidates, and
//! allocating a shared result budget through an optional reranking
//! service before handing ranked excerpts to a downstream answer agent.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod rerank;
pub mod retrieval;
pub mod services;
pub mod transform;

pub use error::{Result, TradeSearchError};
