//! Model collaborator - the outbound LLM call
//!
//! The orchestrator depends only on [`ModelClient`]; the rate limiter and
//! retry policy exist to tame this collaborator. [`OpenAiClient`] is the
//! shipped implementation, speaking the OpenAI-compatible chat-completions
//! protocol.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::ServiceConfig;

/// Response-length cap sent with every generation request
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
/// Low temperature keeps critiques focused and reproducible
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// One generation request against the model collaborator
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Failures of the model collaborator
///
/// All of these are treated as transient by the retry policy.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The API answered 2xx but carried no usable text
    #[error("Model returned an empty completion")]
    EmptyCompletion,
}

/// The external LLM call, abstracted for injection in tests
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate text for the request, or fail with a transient error
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError>;
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.model_api_base.trim_end_matches('/').to_string(),
            api_key: config.model_api_key.clone(),
            model: config.model_name.clone(),
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.prompt },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = response.json().await?;
        let text = payload
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ModelError::EmptyCompletion)?;

        debug!(model = %self.model, chars = text.len(), "model completion received");
        Ok(text)
    }
}
