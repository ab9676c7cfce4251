//! Configuration management for tradesearch
//!
//! One TOML file describes the pipeline defaults and the four remote
//! services (query rewriting, embeddings, vector index, reranker).
//! API keys never live in the file; the file names the environment
//! variable that carries each key.

use crate::error::{Result, TradeSearchError};
use crate::rerank::RerankStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub pipeline: PipelineConfig,
    pub transformer: TransformerConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub reranker: RerankerConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Pipeline defaults, overridable per request from the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidates fetched from the index per query
    pub fetch_limit: usize,
    /// Total passages handed to the answer agent
    pub final_k: usize,
    pub strategy: RerankStrategy,
    /// Maximum excerpt length in characters
    pub excerpt_max_chars: usize,
    /// Use the raw question as the sole query when rewriting fails
    pub raw_question_fallback: bool,
}

/// Query rewriting model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub url: String,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
}

/// Reranking service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TradeSearchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TradeSearchError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TradeSearchError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: TRADESEARCH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("TRADESEARCH_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "PIPELINE__STRATEGY" => {
                self.pipeline.strategy =
                    value
                        .parse()
                        .map_err(|message| TradeSearchError::InvalidConfigValue {
                            path: path.to_string(),
                            message,
                        })?;
            }
            "PIPELINE__FINAL_K" => {
                self.pipeline.final_k =
                    value
                        .parse()
                        .map_err(|_| TradeSearchError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Cannot parse '{}' as integer", value),
                        })?;
            }
            "PIPELINE__FETCH_LIMIT" => {
                self.pipeline.fetch_limit =
                    value
                        .parse()
                        .map_err(|_| TradeSearchError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Cannot parse '{}' as integer", value),
                        })?;
            }
            "RERANKER__ENABLED" => {
                self.reranker.enabled =
                    value
                        .parse()
                        .map_err(|_| TradeSearchError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Cannot parse '{}' as boolean", value),
                        })?;
            }
            "RERANKER__ENDPOINT" => {
                self.reranker.endpoint = value.to_string();
            }
            "VECTOR_STORE__URL" => {
                self.vector_store.url = value.to_string();
            }
            "VECTOR_STORE__COLLECTION" => {
                self.vector_store.collection = value.to_string();
            }
            "TRANSFORMER__MODEL" => {
                self.transformer.model = value.to_string();
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            TradeSearchError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("tradesearch").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
            },
            pipeline: PipelineConfig {
                fetch_limit: 25,
                final_k: 10,
                strategy: RerankStrategy::Balanced,
                excerpt_max_chars: 500,
                raw_question_fallback: true,
            },
            transformer: TransformerConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                temperature: 0.1,
                timeout_secs: 30,
            },
            embedding: EmbeddingConfig {
                endpoint: "https://api.openai.com/v1/embeddings".to_string(),
                model: "text-embedding-3-large".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                timeout_secs: 30,
            },
            vector_store: VectorStoreConfig {
                url: "http://localhost:6333".to_string(),
                collection: "trade_documents".to_string(),
                api_key_env: Some("QDRANT_API_KEY".to_string()),
                timeout_secs: 60,
            },
            reranker: RerankerConfig {
                enabled: true,
                endpoint: "http://localhost:8000/rerank".to_string(),
                timeout_secs: 30,
            },
        }
    }
}

/// Read an API key from the environment variable a config section names
pub fn read_api_key(env_name: &str) -> Result<String> {
    std::env::var(env_name).map_err(|_| {
        TradeSearchError::Config(format!("Environment variable {env_name} is not set"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.pipeline.fetch_limit, config.pipeline.fetch_limit);
        assert_eq!(loaded.pipeline.strategy, config.pipeline.strategy);
        assert_eq!(loaded.vector_store.collection, config.vector_store.collection);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(
            result,
            Err(TradeSearchError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_env_override_strategy() {
        let mut config = Config::default();
        config
            .set_value_from_env("PIPELINE__STRATEGY", "unified")
            .unwrap();
        assert_eq!(config.pipeline.strategy, RerankStrategy::Unified);
    }

    #[test]
    fn test_env_override_rejects_bad_value() {
        let mut config = Config::default();
        let result = config.set_value_from_env("PIPELINE__FINAL_K", "lots");
        assert!(result.is_err());
    }
}
