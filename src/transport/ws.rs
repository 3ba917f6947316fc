//! WebSocket endpoint implementing a fixed event-ordering contract:
//! `connected` once, then `session_start`, then any number of
//! `status`/`content`/`citation`/`artifact` events, then exactly one
//! terminal `complete` or `error`. `cancel` aborts the in-flight turn at
//! its current suspension point (tokio cancels a task by dropping its
//! future at the next `.await`, a cooperative stop without threading a
//! cancellation flag through every node).

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::events::{EventSink, ServerEvent};
use crate::transport::AppState;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum ClientMessage {
    Query { query: String, #[serde(default)] session_id: Option<String> },
    Cancel { #[serde(default)] message_id: Option<String> },
}

/// Forwards every `ServerEvent` emitted by the graph onto an mpsc channel,
/// letting the websocket's write half stay single-owner.
struct ChannelSink {
    tx: tokio::sync::mpsc::UnboundedSender<ServerEvent>,
}

#[async_trait::async_trait]
impl EventSink for ChannelSink {
    async fn on_event(&self, event: ServerEvent) {
        let _ = self.tx.send(event);
    }
}

async fn run_session(mut socket: WebSocket, state: AppState) {
    let session_id = uuid::Uuid::new_v4().to_string();
    if socket
        .send(Message::Text(json!({"type": "connected", "data": {"session_id": session_id}}).to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    let mut in_flight: Option<tokio::task::JoinHandle<()>> = None;
    let mut events: Option<tokio::sync::mpsc::UnboundedReceiver<ServerEvent>> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let parsed: Result<ClientMessage, _> = serde_json::from_str(&text);
                        match parsed {
                            Ok(ClientMessage::Cancel { .. }) => {
                                if let Some(handle) = in_flight.take() {
                                    handle.abort();
                                    events = None;
                                    let _ = socket
                                        .send(Message::Text(json!({"type": "error", "data": {"reason": "cancelled"}}).to_string().into()))
                                        .await;
                                }
                            }
                            Ok(ClientMessage::Query { query, session_id: client_session }) => {
                                if let Some(handle) = in_flight.take() {
                                    handle.abort();
                                }
                                let turn_session = client_session.unwrap_or_else(|| session_id.clone());
                                if socket
                                    .send(Message::Text(json!({"type": "session_start", "data": {"session_id": turn_session}}).to_string().into()))
                                    .await
                                    .is_err()
                                {
                                    break;
                                }

                                let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
                                let orchestrator = state.orchestrator.clone();
                                let run_handle = tokio::spawn(async move {
                                    let sink = ChannelSink { tx };
                                    let _ = orchestrator.run_turn(&query, &turn_session, Vec::new(), &sink).await;
                                });
                                in_flight = Some(run_handle);
                                events = Some(rx);
                            }
                            Err(_) => {
                                let _ = socket
                                    .send(Message::Text(json!({"type": "error", "data": {"reason": "validation"}}).to_string().into()))
                                    .await;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = async { events.as_mut().unwrap().recv().await }, if events.is_some() => {
                match event {
                    Some(event) => {
                        if socket.send(Message::Text(to_wire_message(&event).to_string().into())).await.is_err() {
                            if let Some(handle) = in_flight.take() {
                                handle.abort();
                            }
                            return;
                        }
                    }
                    None => {
                        // The run's sink channel closed: the turn finished
                        // and already emitted its own terminal event.
                        events = None;
                        in_flight = None;
                    }
                }
            }
        }
    }

    if let Some(handle) = in_flight {
        handle.abort();
    }
}

/// Translate the internal, granular `ServerEvent` vocabulary onto the
/// wire's closed `{connected, session_start, status, content, citation,
/// artifact, complete, error}` type set.
fn to_wire_message(event: &ServerEvent) -> serde_json::Value {
    match event {
        ServerEvent::NodeStarted { node } => json!({"type": "status", "data": {"node": node, "phase": "started"}}),
        ServerEvent::NodeCompleted { node, duration_ms } => json!({"type": "status", "data": {"node": node, "phase": "completed", "duration_ms": duration_ms}}),
        ServerEvent::ToolCallStarted { tool } => json!({"type": "status", "data": {"tool": tool, "phase": "started"}}),
        ServerEvent::ToolCallCompleted { tool, success } => json!({"type": "status", "data": {"tool": tool, "phase": "completed", "success": success}}),
        ServerEvent::SubAgentStarted { agent } => json!({"type": "status", "data": {"agent": agent, "phase": "started"}}),
        ServerEvent::SubAgentCompleted { agent, success, confidence } => {
            json!({"type": "status", "data": {"agent": agent, "phase": "completed", "success": success, "confidence": confidence}})
        }
        ServerEvent::Warning { message } => json!({"type": "status", "data": {"warning": message}}),
        ServerEvent::ResponseToken { token } => json!({"type": "content", "data": {"token": token}}),
        ServerEvent::CitationsAvailable { citations } => json!({"type": "citation", "data": {"citations": citations}}),
        ServerEvent::ArtifactReady { artifact } => json!({"type": "artifact", "data": artifact}),
        ServerEvent::Complete { query_fingerprint, confidence, tools_used, duration_ms } => {
            json!({"type": "complete", "data": {"query_fingerprint": query_fingerprint, "confidence": confidence, "tools_used": tools_used, "duration_ms": duration_ms}})
        }
        ServerEvent::Error { reason } => json!({"type": "error", "data": {"reason": reason}}),
    }
}
