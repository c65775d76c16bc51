//! Streamed analysis - progress events over a long-lived connection
//!
//! Drives the orchestrator's per-agent loop while publishing progress as an
//! ordered event sequence. Two independent deadlines apply: the whole stream
//! races a global timer, and each agent invocation races its own. Both races
//! are first-settle-wins; the losing future is dropped and its result
//! discarded.
//!
//! Ordering guarantees, per agent: `agent-start` precedes its
//! `analysis-chunk`s, which precede exactly one of `agent-complete` /
//! `agent-error`. Exactly one terminal event (`analysis-complete` or
//! `error`) closes the stream and nothing is emitted after it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::error::AnalysisError;
use crate::orchestrator::Orchestrator;

/// Whole-stream deadline
pub const GLOBAL_TIMEOUT: Duration = Duration::from_secs(300);
/// Per-agent invocation deadline, backoff waits included
pub const AGENT_TIMEOUT: Duration = Duration::from_secs(60);
/// Transcripts are split into pieces of this many characters
pub const CHUNK_CHARS: usize = 500;

/// One unit of the server-to-client progress protocol
///
/// Wire form: `type` tag in kebab-case, fields in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    AnalysisStart {
        total_agents: usize,
    },
    AgentStart {
        agent_id: String,
        agent_name: String,
        /// Percent of the panel already dispatched, rounded
        progress: u32,
    },
    AnalysisChunk {
        agent_id: String,
        chunk: String,
        timestamp: DateTime<Utc>,
    },
    AgentComplete {
        agent_id: String,
        agent_name: String,
    },
    AgentError {
        agent_id: String,
        error: String,
    },
    AnalysisComplete {
        message: String,
    },
    Error {
        error: String,
    },
}

impl StreamEvent {
    /// Encode as one server-sent-event frame: `data: <JSON>\n\n`
    pub fn to_sse(&self) -> String {
        let json = serde_json::to_string(self).expect("stream events serialize infallibly");
        format!("data: {json}\n\n")
    }

    /// Terminal events close the stream; nothing may follow them
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::AnalysisComplete { .. } | StreamEvent::Error { .. }
        )
    }
}

/// Consumer-side handle for cancelling a running stream
///
/// Cancellation sets the shared completion flag: every later emission is
/// suppressed and the producer exits at its next emit. Cancelling twice is
/// a no-op.
#[derive(Clone)]
pub struct StreamHandle {
    completed: Arc<AtomicBool>,
}

impl StreamHandle {
    pub fn cancel(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

/// A running analysis stream: the event feed plus its cancel handle
///
/// Dropping the stream cancels the producer, which is how a client
/// disconnect propagates.
pub struct AnalysisStream {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    handle: StreamHandle,
}

impl AnalysisStream {
    /// Next event; `None` once the stream has closed
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }
}

impl Drop for AnalysisStream {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

/// Producer side: the completion flag is checked before every emission
struct Emitter {
    tx: mpsc::UnboundedSender<StreamEvent>,
    completed: Arc<AtomicBool>,
}

impl Emitter {
    /// Emit unless the stream has completed or the consumer is gone.
    /// Returns false when the producer should stop.
    fn emit(&self, event: StreamEvent) -> bool {
        if self.completed.load(Ordering::SeqCst) {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    /// Idempotent: closing an already-closed stream is a no-op
    fn close(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }
}

/// Start a streamed panel analysis
///
/// Spawns the producer and returns the event feed immediately. The producer
/// runs the agent loop under [`GLOBAL_TIMEOUT`] and closes the stream after
/// its single terminal event.
pub fn stream_analysis(
    orchestrator: Arc<Orchestrator>,
    paper_content: String,
    paper_title: String,
) -> AnalysisStream {
    let (tx, events) = mpsc::unbounded_channel();
    let completed = Arc::new(AtomicBool::new(false));

    let emitter = Emitter {
        tx,
        completed: Arc::clone(&completed),
    };

    tokio::spawn(run_stream(orchestrator, paper_content, paper_title, emitter));

    AnalysisStream {
        events,
        handle: StreamHandle { completed },
    }
}

#[instrument(skip_all)]
async fn run_stream(
    orchestrator: Arc<Orchestrator>,
    paper_content: String,
    paper_title: String,
    emitter: Emitter,
) {
    tokio::select! {
        _ = drive_agents(&orchestrator, &paper_content, &paper_title, &emitter) => {}
        _ = tokio::time::sleep(GLOBAL_TIMEOUT) => {
            warn!(timeout_secs = GLOBAL_TIMEOUT.as_secs(), "analysis stream hit global timeout");
            emitter.emit(StreamEvent::Error {
                error: "Analysis timeout - please try again".to_string(),
            });
        }
    }
    emitter.close();
}

async fn drive_agents(
    orchestrator: &Orchestrator,
    paper_content: &str,
    paper_title: &str,
    emitter: &Emitter,
) {
    let agents = orchestrator.agents();
    let total = agents.len();

    if !emitter.emit(StreamEvent::AnalysisStart {
        total_agents: total,
    }) {
        return;
    }

    for (i, agent) in agents.iter().enumerate() {
        let progress = ((i as f64 / total as f64) * 100.0).round() as u32;
        if !emitter.emit(StreamEvent::AgentStart {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            progress,
        }) {
            return;
        }

        // First-settle-wins race between the invocation and its deadline;
        // on timeout the invocation future is dropped, not awaited further.
        let outcome = timeout(
            AGENT_TIMEOUT,
            orchestrator.analyze_with_agent(&agent.id, paper_content, paper_title),
        )
        .await;

        match outcome {
            Ok(Ok(result)) => {
                for chunk in chunk_text(&result.analysis, CHUNK_CHARS) {
                    if !emitter.emit(StreamEvent::AnalysisChunk {
                        agent_id: agent.id.clone(),
                        chunk,
                        timestamp: Utc::now(),
                    }) {
                        return;
                    }
                }
                if !emitter.emit(StreamEvent::AgentComplete {
                    agent_id: agent.id.clone(),
                    agent_name: agent.name.clone(),
                }) {
                    return;
                }
                debug!(agent_id = %agent.id, "agent streamed");
            }
            Ok(Err(e)) => {
                // One agent's failure never aborts the batch.
                if !emitter.emit(StreamEvent::AgentError {
                    agent_id: agent.id.clone(),
                    error: e.to_string(),
                }) {
                    return;
                }
            }
            Err(_) => {
                let e = AnalysisError::Timeout(AGENT_TIMEOUT);
                warn!(agent_id = %agent.id, "agent invocation timed out");
                if !emitter.emit(StreamEvent::AgentError {
                    agent_id: agent.id.clone(),
                    error: e.to_string(),
                }) {
                    return;
                }
            }
        }
    }

    info!(agents = total, "analysis stream finished");
    emitter.emit(StreamEvent::AnalysisComplete {
        message: "Multi-agent analysis completed".to_string(),
    });
}

/// Split into fixed-size character chunks so no single event carries an
/// oversized payload; never splits inside a code point
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
