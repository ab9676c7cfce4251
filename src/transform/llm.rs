//! Chat-completions backed query transformer

use std::time::Duration;

use serde::Deserialize;

use super::{QueryPlan, QueryTransformer, TransformError, TransformPayload};
use crate::config::TransformerConfig;

const SYSTEM_PROMPT: &str = "\
You optimize user questions about trade documents for vector search.\n\
Respond with strict JSON only:\n\
{\"rewritten_query\": \"search-optimized rewrite of the question\",\n \
\"sub_queries\": null or a list of 2+ focused queries when the question \
spans multiple topics,\n \
\"reasoning\": \"one sentence explaining the decision\"}\n\
Keep sub-queries in the language of the question. Do not decompose \
single-topic questions.";

/// Query transformer backed by an OpenAI-style chat-completions endpoint
pub struct OpenAiTransformer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiTransformer {
    pub fn new(config: &TransformerConfig, api_key: String) -> Result<Self, TransformError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransformError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Strip a markdown code fence if the model wrapped its JSON in one
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait::async_trait]
impl QueryTransformer for OpenAiTransformer {
    async fn transform(&self, question: &str) -> Result<QueryPlan, TransformError> {
        if question.trim().is_empty() {
            return Err(TransformError::InvalidInput(
                "Question cannot be empty".to_string(),
            ));
        }

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": question},
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransformError::RequestError(e.to_string()))?
            .error_for_status()
            .map_err(|e| TransformError::RequestError(e.to_string()))?;

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| TransformError::MalformedResponse(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| {
                TransformError::MalformedResponse("response contained no choices".to_string())
            })?;

        let payload: TransformPayload = serde_json::from_str(strip_code_fence(content))
            .map_err(|e| TransformError::MalformedResponse(e.to_string()))?;

        let plan = payload.into_plan(question)?;

        tracing::debug!(
            rewritten = %plan.rewritten,
            sub_queries = plan.sub_queries.len(),
            "query transformed"
        );

        Ok(plan)
    }
}
