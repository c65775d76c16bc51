//! Analysis error types

use std::time::Duration;
use thiserror::Error;

use crate::model::ModelError;

/// Errors that can occur in the review pipeline
///
/// Inside the agent loop these never escape to the caller: transient model
/// failures and timeouts become degraded results or stream events. Only
/// validation and unknown-agent errors surface before output begins.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Agent id not present in the registry
    #[error("Agent not found: {0}")]
    UnknownAgent(String),

    /// Missing or malformed request fields
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Model collaborator failure
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// An invocation exceeded its deadline
    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
