//! Configuration validation

use super::Config;
use crate::error::{Result, TradeSearchError, ValidationError};

/// Validates configuration values before the pipeline runs
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration, collecting every failure
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        if config.pipeline.fetch_limit == 0 {
            errors.push(ValidationError::new(
                "pipeline.fetch_limit",
                "must be positive",
            ));
        }
        if config.pipeline.final_k == 0 {
            errors.push(ValidationError::new("pipeline.final_k", "must be positive"));
        }
        if config.pipeline.excerpt_max_chars == 0 {
            errors.push(ValidationError::new(
                "pipeline.excerpt_max_chars",
                "must be positive",
            ));
        }
        if config.pipeline.final_k > config.pipeline.fetch_limit {
            errors.push(ValidationError::new(
                "pipeline.final_k",
                "cannot exceed pipeline.fetch_limit",
            ));
        }

        Self::check_endpoint(&mut errors, "transformer.endpoint", &config.transformer.endpoint);
        Self::check_endpoint(&mut errors, "embedding.endpoint", &config.embedding.endpoint);
        Self::check_endpoint(&mut errors, "vector_store.url", &config.vector_store.url);
        if config.reranker.enabled {
            Self::check_endpoint(&mut errors, "reranker.endpoint", &config.reranker.endpoint);
        }

        if config.transformer.model.trim().is_empty() {
            errors.push(ValidationError::new("transformer.model", "must not be empty"));
        }
        if config.embedding.model.trim().is_empty() {
            errors.push(ValidationError::new("embedding.model", "must not be empty"));
        }
        if config.vector_store.collection.trim().is_empty() {
            errors.push(ValidationError::new(
                "vector_store.collection",
                "must not be empty",
            ));
        }

        if !(0.0..=2.0).contains(&config.transformer.temperature) {
            errors.push(ValidationError::new(
                "transformer.temperature",
                "must be between 0.0 and 2.0",
            ));
        }

        for (path, timeout) in [
            ("transformer.timeout_secs", config.transformer.timeout_secs),
            ("embedding.timeout_secs", config.embedding.timeout_secs),
            ("vector_store.timeout_secs", config.vector_store.timeout_secs),
            ("reranker.timeout_secs", config.reranker.timeout_secs),
        ] {
            if timeout == 0 {
                errors.push(ValidationError::new(path, "must be positive"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TradeSearchError::ConfigValidation { errors })
        }
    }

    fn check_endpoint(errors: &mut Vec<ValidationError>, path: &str, value: &str) {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            errors.push(ValidationError::new(path, "must be an http(s) URL"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_final_k_rejected() {
        let mut config = Config::default();
        config.pipeline.final_k = 0;

        let result = ConfigValidator::validate(&config);
        assert!(matches!(
            result,
            Err(TradeSearchError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_final_k_above_fetch_limit_rejected() {
        let mut config = Config::default();
        config.pipeline.final_k = 50;
        config.pipeline.fetch_limit = 25;

        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let mut config = Config::default();
        config.vector_store.url = "localhost:6333".to_string();

        let result = ConfigValidator::validate(&config);
        let Err(TradeSearchError::ConfigValidation { errors }) = result else {
            panic!("expected validation failure");
        };
        assert!(errors.iter().any(|e| e.path == "vector_store.url"));
    }

    #[test]
    fn test_disabled_reranker_endpoint_not_checked() {
        let mut config = Config::default();
        config.reranker.enabled = false;
        config.reranker.endpoint = String::new();

        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = Config::default();
        config.pipeline.final_k = 0;
        config.embedding.model = String::new();

        let Err(TradeSearchError::ConfigValidation { errors }) =
            ConfigValidator::validate(&config)
        else {
            panic!("expected validation failure");
        };
        assert!(errors.len() >= 2);
    }
}
