//! Streaming event protocol pushed over the WebSocket transport: a closed,
//! tag-content serde enum plus an async-trait sink with no-op defaults so
//! callers only override what they care about.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Artifact, Citation};

/// Every event the master graph may emit while running one query. Closed
/// enum: a wire consumer can exhaustively match on `type` without an
/// `_ => {}` catch-all silently eating new variants added later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A graph node started running.
    NodeStarted { node: String },
    /// A graph node finished, with its wall-clock duration.
    NodeCompleted { node: String, duration_ms: i64 },
    /// A tool call was dispatched.
    ToolCallStarted { tool: String },
    /// A tool call returned.
    ToolCallCompleted { tool: String, success: bool },
    /// A sub-agent was dispatched.
    SubAgentStarted { agent: String },
    /// A sub-agent returned its uniform result.
    SubAgentCompleted { agent: String, success: bool, confidence: f32 },
    /// Incremental token of the synthesized response, in arrival order.
    ResponseToken { token: String },
    /// One or more citations became available.
    CitationsAvailable { citations: Vec<Citation> },
    /// A visualization artifact was produced.
    ArtifactReady { artifact: Artifact },
    /// The turn finished successfully. Maps onto the wire protocol's
    /// `complete` message: `{message_id, confidence, tools_used,
    /// duration_ms}`.
    Complete { query_fingerprint: String, confidence: f32, tools_used: Vec<String>, duration_ms: i64 },
    /// A recoverable error occurred; the session may continue.
    Warning { message: String },
    /// An unrecoverable error ended the turn. Maps onto the wire protocol's
    /// `error` message; `reason` is e.g. "cancelled", "timeout", or a
    /// synthesis failure summary.
    Error { reason: String },
}

/// Sink for `ServerEvent`s. Default methods are no-ops so a caller that only
/// cares about artifacts can override `on_event` with a single match arm.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn on_event(&self, event: ServerEvent);
}

/// An `EventSink` that drops every event. Used by callers that want to run
/// the orchestrator without a live transport attached.
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn on_event(&self, _event: ServerEvent) {}
}

/// An `EventSink` that appends events to an in-memory vector, used in tests
/// to assert on event ordering without standing up a transport.
#[derive(Default)]
pub struct RecordingSink {
    events: tokio::sync::Mutex<Vec<ServerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn drain(&self) -> Vec<ServerEvent> {
        self.events.lock().await.drain(..).collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn on_event(&self, event: ServerEvent) {
        self.events.lock().await.push(event);
    }
}
