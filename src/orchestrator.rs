//! Review orchestration - sequential panel invocation
//!
//! Agents are invoked strictly one at a time, never concurrently. That is a
//! deliberate throughput/latency trade-off: the rate limiter has a single
//! cursor, and sequential issue keeps backoff waits from interleaving.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, instrument, warn};

use crate::error::AnalysisError;
use crate::limiter::RateLimiter;
use crate::model::{GenerationRequest, ModelClient, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::registry::{builtin_agents, Agent};
use crate::score::score_analysis;
use crate::store::PaperRecord;

/// Paper content is cut to this many characters before prompting
pub const MAX_CONTENT_CHARS: usize = 8000;
/// Attempts per agent invocation, retries included
pub const MAX_ATTEMPTS: u32 = 3;

const TRUNCATION_MARKER: &str = "... [content truncated]";

/// One agent's verdict on a paper
///
/// Immutable once produced. Either a real transcript or a degraded
/// placeholder with score 0; the type does not distinguish the two, so
/// consumers must tolerate both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub agent_id: String,
    pub agent_name: String,
    pub analysis: String,
    /// Heuristic quality score in `[0, 1]`; 0 marks a degraded result
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

/// A request to analyze one stored paper
///
/// Transient: scoped to a single orchestration call, never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub paper_id: String,
    pub paper: PaperRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_types: Option<Vec<String>>,
}

/// Sequences the review panel over a paper
///
/// Owns the registry, the model collaborator, and the rate limiter.
pub struct Orchestrator {
    agents: Vec<Agent>,
    model: Arc<dyn ModelClient>,
    limiter: RateLimiter,
}

impl Orchestrator {
    /// Orchestrator over the built-in panel with default call spacing
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self::with_agents(builtin_agents(), model, RateLimiter::default())
    }

    /// Orchestrator over a custom registry, for tests and embedding
    pub fn with_agents(
        agents: Vec<Agent>,
        model: Arc<dyn ModelClient>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            agents,
            model,
            limiter,
        }
    }

    /// Defensive copy of the registry; mutating it cannot touch the
    /// orchestrator's own list
    pub fn agents(&self) -> Vec<Agent> {
        self.agents.clone()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Run one agent against the paper
    ///
    /// Truncates the content, rate-limits every attempt, retries transient
    /// model failures with exponential backoff (2s, 4s), and on exhaustion
    /// returns a degraded result instead of an error. The only error this
    /// surfaces is an unknown agent id.
    #[instrument(skip(self, paper_content, paper_title))]
    pub async fn analyze_with_agent(
        &self,
        agent_id: &str,
        paper_content: &str,
        paper_title: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let agent = self
            .agents
            .iter()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| AnalysisError::UnknownAgent(agent_id.to_string()))?;

        let prompt = build_prompt(paper_content, paper_title);
        let mut last_error: Option<AnalysisError> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            self.limiter.acquire().await;

            let request = GenerationRequest {
                system_prompt: agent.system_prompt.clone(),
                prompt: prompt.clone(),
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: DEFAULT_TEMPERATURE,
            };

            match self.model.generate(request).await {
                Ok(text) => {
                    let score = score_analysis(&text);
                    debug!(agent_id = %agent.id, attempt, score, "analysis complete");

                    return Ok(AnalysisResult {
                        agent_id: agent.id.clone(),
                        agent_name: agent.name.clone(),
                        analysis: text,
                        score,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    warn!(agent_id = %agent.id, attempt, error = %e, "analysis attempt failed");
                    last_error = Some(e.into());

                    if attempt < MAX_ATTEMPTS {
                        sleep(Duration::from_secs(1u64 << attempt)).await;
                    }
                }
            }
        }

        // All retries exhausted: failure becomes data, never a fault.
        let message = match last_error {
            Some(e) => format!("Analysis failed after {MAX_ATTEMPTS} attempts. Error: {e}"),
            None => format!("Analysis failed after {MAX_ATTEMPTS} attempts. Error: unknown error"),
        };
        Ok(degraded_result(agent, message))
    }

    /// Run the whole panel sequentially, in registry order
    ///
    /// Always returns exactly one result per registered agent: an escaped
    /// per-agent error is converted to a degraded result rather than
    /// aborting the batch.
    #[instrument(skip_all, fields(agents = self.agents.len()))]
    pub async fn analyze_with_all_agents(
        &self,
        paper_content: &str,
        paper_title: &str,
    ) -> Vec<AnalysisResult> {
        let mut results = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            match self
                .analyze_with_agent(&agent.id, paper_content, paper_title)
                .await
            {
                Ok(result) => results.push(result),
                Err(e) => {
                    // Defensive: invocation degrades failures itself, but one
                    // agent must never abort the batch.
                    warn!(agent_id = %agent.id, error = %e, "agent failed outside retry loop");
                    results.push(degraded_result(agent, format!("Analysis failed: {e}")));
                }
            }
        }

        info!(results = results.len(), "panel analysis finished");
        results
    }
}

/// Degraded result standing in for a failed invocation
pub(crate) fn degraded_result(agent: &Agent, message: String) -> AnalysisResult {
    AnalysisResult {
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        analysis: message,
        score: 0.0,
        timestamp: Utc::now(),
    }
}

/// Cut the content to [`MAX_CONTENT_CHARS`] characters, marking the cut
fn truncate_content(content: &str) -> Cow<'_, str> {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_index, _)) => {
            Cow::Owned(format!("{}{}", &content[..byte_index], TRUNCATION_MARKER))
        }
        None => Cow::Borrowed(content),
    }
}

fn build_prompt(paper_content: &str, paper_title: &str) -> String {
    format!(
        "Please analyze the following research paper:\n\n\
         Title: {}\n\n\
         Content: {}\n\n\
         Provide a comprehensive analysis from your specialized perspective. \
         Include specific observations, strengths, weaknesses, and recommendations.",
        paper_title,
        truncate_content(paper_content),
    )
}
