use std::path::PathBuf;
use thiserror::Error;

use crate::transform::TransformError;

/// Main error type for the tradesearch pipeline
///
/// Only query transformation (without a configured fallback) and request
/// validation surface as request failures. Retrieval and reranking errors
/// are absorbed into graceful degradation by the stages that own them.
#[derive(Error, Debug)]
pub enum TradeSearchError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// A request that cannot be executed: empty question, zero usable
    /// queries, non-positive budget or fetch limit
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Query rewriting/decomposition failed and no fallback was configured
    #[error("Query transformation failed: {0}")]
    Transformation(#[from] TransformError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for tradesearch operations
pub type Result<T> = std::result::Result<T, TradeSearchError>;
