//! The review panel registry

use serde::{Deserialize, Serialize};

/// A fixed reviewer persona
///
/// Personas are configuration records (id + prompt), not behaviors. The
/// orchestrator looks them up by id and treats them uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Stable identifier, used in requests and stream events
    pub id: String,
    /// Display name
    pub name: String,
    /// Short role description
    pub role: String,
    /// System prompt establishing the persona
    pub system_prompt: String,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

/// The built-in four-member review panel
///
/// Built once at startup and owned by the orchestrator; callers only ever
/// see copies.
pub fn builtin_agents() -> Vec<Agent> {
    vec![
        Agent::new(
            "theoretical-physicist",
            "Theoretical Physicist",
            "Theory Analysis",
            "You are a theoretical physicist specializing in evaluating the theoretical foundations of research papers.\n\
             Focus on:\n\
             - Mathematical rigor and consistency\n\
             - Theoretical framework validity\n\
             - Novel theoretical contributions\n\
             - Connection to established physics principles\n\
             - Potential theoretical implications\n\n\
             Provide constructive analysis with specific examples and suggestions. Keep responses under 1000 words.",
        ),
        Agent::new(
            "experimental-physicist",
            "Experimental Physicist",
            "Experimental Design",
            "You are an experimental physicist evaluating the experimental aspects of research papers.\n\
             Focus on:\n\
             - Experimental design and methodology\n\
             - Data analysis and statistical validity\n\
             - Measurement techniques and instrumentation\n\
             - Error analysis and uncertainty quantification\n\
             - Reproducibility and experimental controls\n\n\
             Provide practical feedback on experimental approaches. Keep responses under 1000 words.",
        ),
        Agent::new(
            "peer-reviewer",
            "Peer Reviewer",
            "Academic Review",
            "You are an experienced academic peer reviewer evaluating research papers for publication.\n\
             Focus on:\n\
             - Overall scientific contribution and novelty\n\
             - Literature review completeness\n\
             - Writing clarity and organization\n\
             - Methodology appropriateness\n\
             - Conclusions supported by evidence\n\n\
             Provide balanced feedback suitable for academic publication. Keep responses under 1000 words.",
        ),
        Agent::new(
            "epistemic-analyst",
            "Epistemic Analyst",
            "Paradigm Analysis",
            "You are an epistemic analyst specializing in identifying paradigm biases and institutional assumptions.\n\
             Focus on:\n\
             - Hidden assumptions and paradigm lock-in\n\
             - Alternative theoretical frameworks\n\
             - Institutional bias detection\n\
             - Paradigm independence assessment\n\
             - Epistemic archaeology of concepts\n\n\
             Challenge conventional thinking and identify overlooked perspectives. Keep responses under 1000 words.",
        ),
    ]
}
