//! Plain HTTP handlers. Every handler is a thin translation layer:
//! validation and business logic stay in `orchestrator`/`master`/
//! `subagents`, not here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::events::NullSink;
use crate::master::GraphNode;
use crate::transport::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

#[derive(serde::Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
    pub session_id: String,
}

/// One-shot, non-streaming turn. The WebSocket endpoint is the
/// intermediate-event-aware counterpart; this is for callers that only
/// want the final `Query`.
pub async fn analyze(State(state): State<AppState>, Json(req): Json<AnalyzeRequest>) -> impl IntoResponse {
    match state.orchestrator.run_turn(&req.query, &req.session_id, Vec::new(), &NullSink).await {
        Ok(query) => (
            StatusCode::OK,
            Json(json!({
                "query_text": query.query_text,
                "fingerprint": query.fingerprint,
                "status": query.status,
                "tools_used": query.tools_used,
                "confidence": query.confidence,
                "timings": query.timings,
            })),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))).into_response(),
    }
}

/// Static description of the seven-node graph, useful for a UI that wants
/// to render the pipeline without hardcoding it.
pub async fn graph_structure() -> impl IntoResponse {
    let nodes = [
        GraphNode::ConversationManager,
        GraphNode::StrategicPlanner,
        GraphNode::ToolExecutor,
        GraphNode::DecisionGate,
        GraphNode::ResponseSynthesizer,
        GraphNode::ArtifactDecision,
        GraphNode::ArtifactCreator,
    ];
    Json(json!({
        "nodes": nodes.iter().map(|n| n.name()).collect::<Vec<_>>(),
        "edges": [
            ["conversation_manager", "strategic_planner"],
            ["strategic_planner", "tool_executor"],
            ["tool_executor", "decision_gate"],
            ["decision_gate", "strategic_planner"],
            ["decision_gate", "response_synthesizer"],
            ["response_synthesizer", "artifact_decision"],
            ["artifact_decision", "artifact_creator"],
        ],
    }))
}

pub async fn graph_execution(State(state): State<AppState>, Path(session_id): Path<String>) -> impl IntoResponse {
    match state.record_store.load_trace(&session_id).await {
        Ok(trace) => (StatusCode::OK, Json(json!({"session_id": session_id, "execution_log": trace}))).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, Json(json!({"error": e.to_string()}))).into_response(),
    }
}

pub async fn artifact(State(state): State<AppState>, Path((artifact_id, ext)): Path<(String, String)>) -> impl IntoResponse {
    let key = format!("artifacts/{}/{}", artifact_id, format_filename(&ext));
    match state.object_store.get(&key).await {
        Ok(bytes) => (StatusCode::OK, bytes).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, Json(json!({"error": e.to_string()}))).into_response(),
    }
}

fn format_filename(ext: &str) -> &'static str {
    match ext {
        "xlsx" => "table.xlsx",
        "json" => "data.json",
        _ => "chart.html",
    }
}

#[derive(serde::Deserialize)]
pub struct ExplosiveTopicsQuery {
    #[serde(default)]
    pub keywords: Option<String>,
}

/// Runs `live_political_monitor_agent` directly, outside the master graph's
/// iteration loop, and returns its already-classified topics.
pub async fn explosive_topics(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<ExplosiveTopicsQuery>,
) -> impl IntoResponse {
    let keywords: Vec<String> = params
        .keywords
        .map(|s| s.split(',').map(|k| k.trim().to_string()).filter(|k| !k.is_empty()).collect())
        .unwrap_or_default();
    let extras = json!({"keywords": keywords});
    let result = state
        .subagents
        .call("live_political_monitor_agent", "current explosive topics", &extras, &state.live_monitor_agent_ctx)
        .await;
    if result.success {
        (StatusCode::OK, Json(result.data)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": result.error}))).into_response()
    }
}
