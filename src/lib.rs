//! # Conclave
//!
//! Multi-agent research paper review - the deliberating panel.
//!
//! A paper goes before a fixed panel of reviewer personas (theoretical
//! physicist, experimental physicist, peer reviewer, epistemic analyst).
//! Each persona is prompted independently against the same LLM collaborator;
//! their verdicts are scored and aggregated, or streamed live to the client
//! as they arrive.
//!
//! ## Architecture
//!
//! ```text
//!   client request
//!        │
//!        ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ORCHESTRATOR                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐   │
//! │  │   Registry   │  │ Rate Limiter │  │    Scorer    │   │
//! │  │ (4 personas) │  │ (1s cursor)  │  │  (lexical)   │   │
//! │  └──────────────┘  └──────────────┘  └──────────────┘   │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ one agent at a time,
//!                             │ retry + backoff per call
//!                             ▼
//!                    ┌─────────────────┐
//!                    │   ModelClient   │  external LLM call
//!                    └────────┬────────┘
//!                             │ scored AnalysisResult
//!                             ▼
//!                    ┌─────────────────┐
//!                    │ Stream Emitter  │  SSE events, timeouts,
//!                    └────────┬────────┘  cooperative cancel
//!                             ▼
//!                          client
//! ```
//!
//! ## Key Concepts
//!
//! - **Agent**: a fixed persona (id + prompt), configuration not behavior
//! - **Degraded result**: a failure represented as data (score 0 + message)
//!   instead of a raised error, so aggregation has one uniform shape
//! - **Stream event**: one unit of the SSE progress protocol
//! - **Sequential orchestration**: agents run one at a time on purpose,
//!   to respect the single rate-limit cursor and keep backoff predictable

pub mod config;
pub mod error;
pub mod limiter;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod score;
pub mod server;
pub mod store;
pub mod stream;

pub use config::ServiceConfig;
pub use error::AnalysisError;
pub use limiter::RateLimiter;
pub use model::{GenerationRequest, ModelClient, ModelError, OpenAiClient};
pub use orchestrator::{AnalysisRequest, AnalysisResult, Orchestrator};
pub use registry::{builtin_agents, Agent};
pub use score::score_analysis;
pub use store::{ConceptSnippet, KnowledgeBase, MemoryStore, PaperRecord, PaperStore};
pub use stream::{stream_analysis, AnalysisStream, StreamEvent, StreamHandle};
