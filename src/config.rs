//! Service configuration from the environment

use anyhow::{Context, Result};
use std::env;

/// Default OpenAI-compatible endpoint
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Mini model keeps per-call cost and rate pressure down
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Port to bind the HTTP server on
    pub port: u16,
    /// Base URL of the OpenAI-compatible model API
    pub model_api_base: String,
    /// API key for the model endpoint
    pub model_api_key: String,
    /// Model identifier sent with every generation request
    pub model_name: String,
    /// Outbound HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    ///
    /// Only the API key is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("CONCLAVE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            model_api_base: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            model_name: env::var("CONCLAVE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            request_timeout_secs: env::var("CONCLAVE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(120),
        })
    }
}
