//! Thin HTTP/WebSocket adapter binding the core orchestrator to a real
//! socket: the minimal axum wiring needed to drive
//! [`crate::orchestrator::Orchestrator`] over the wire — a plain `Router`,
//! no middleware beyond what axum provides out of the box.

mod http;
mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::orchestrator::Orchestrator;
use crate::services::ObjectStore;
use crate::services::RecordStore;
use crate::subagents::SubAgentRegistry;

/// Shared handles every route needs. Cloned per request by axum (cheap:
/// every field is an `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub record_store: Arc<dyn RecordStore>,
    pub object_store: Arc<dyn ObjectStore>,
    pub subagents: Arc<SubAgentRegistry>,
    pub live_monitor_agent_ctx: Arc<crate::subagents::AgentContext>,
}

/// Build the router. The caller owns binding and serving — this returns a
/// plain `Router` rather than blocking inside the function.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::health))
        .route("/api/analyze", post(http::analyze))
        .route("/api/graph/structure", get(http::graph_structure))
        .route("/api/graph/execution/{session_id}", get(http::graph_execution))
        .route("/api/artifacts/{artifact_id}.{ext}", get(http::artifact))
        .route("/api/live-monitor/explosive-topics", get(http::explosive_topics))
        .route("/ws/analyze", get(ws::handler))
        .with_state(state)
}
