//! The seven-node master graph. A single conditional back-edge from
//! `decision_gate` to `strategic_planner` is the only cycle; everything
//! else is a straight pipeline. Modeled as a fixed `GraphNode` enum matched
//! in [`MasterGraph::run`] rather than a pluggable strategy a caller could
//! select at runtime — this graph's topology is fixed, not configurable.

pub mod artifact_creator;
pub mod artifact_decision;
pub mod conversation_manager;
pub mod decision_gate;
pub mod response_synthesizer;
pub mod strategic_planner;
pub mod tool_executor;

use std::sync::Arc;

use crate::config::WorkbenchConfig;
use crate::events::{EventSink, ServerEvent};
use crate::model::{AgentState, TraceRecord, MIN_NODE_DURATION_MS};
use crate::services::{LlmClient, ObjectStore};
use crate::subagents::{AgentContext, SubAgentRegistry};
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNode {
    ConversationManager,
    StrategicPlanner,
    ToolExecutor,
    DecisionGate,
    ResponseSynthesizer,
    ArtifactDecision,
    ArtifactCreator,
}

impl GraphNode {
    pub fn name(&self) -> &'static str {
        match self {
            GraphNode::ConversationManager => "conversation_manager",
            GraphNode::StrategicPlanner => "strategic_planner",
            GraphNode::ToolExecutor => "tool_executor",
            GraphNode::DecisionGate => "decision_gate",
            GraphNode::ResponseSynthesizer => "response_synthesizer",
            GraphNode::ArtifactDecision => "artifact_decision",
            GraphNode::ArtifactCreator => "artifact_creator",
        }
    }
}

/// Outcome of the decision gate: either iterate (back to the planner) or
/// proceed to synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Iterate,
    Proceed,
}

/// Shared, read-only handles every node may need. Established once at
/// orchestrator construction and never mutated afterward.
#[derive(Clone)]
pub struct NodeContext {
    pub llm: Arc<dyn LlmClient>,
    pub tools: ToolRegistry,
    pub subagents: Arc<SubAgentRegistry>,
    pub object_store: Arc<dyn ObjectStore>,
    pub config: WorkbenchConfig,
}

impl NodeContext {
    pub fn agent_context(&self, search: Arc<dyn crate::services::SearchClient>, extract: Arc<dyn crate::services::ExtractClient>) -> AgentContext {
        AgentContext {
            llm: self.llm.clone(),
            search,
            extract,
            object_store: self.object_store.clone(),
            search_max_results: 10,
        }
    }
}

/// Compute a node's reported duration from its bracketing trace records,
/// applying the 50ms floor so fast LLM round-trips never show as "0s" to a
/// downstream dashboard.
pub fn derive_duration_ms(first: &TraceRecord, last: &TraceRecord) -> i64 {
    let elapsed = (last.timestamp - first.timestamp).num_milliseconds().max(0);
    if elapsed < 10 {
        MIN_NODE_DURATION_MS
    } else {
        elapsed.max(MIN_NODE_DURATION_MS)
    }
}

/// Drives one user turn through the graph, emitting `ServerEvent`s as each
/// node starts and finishes and returning the terminal `AgentState`.
pub struct MasterGraph {
    ctx: NodeContext,
}

impl MasterGraph {
    pub fn new(ctx: NodeContext) -> Self {
        Self { ctx }
    }

    pub async fn run(
        &self,
        mut state: AgentState,
        search: Arc<dyn crate::services::SearchClient>,
        extract: Arc<dyn crate::services::ExtractClient>,
        sink: &dyn EventSink,
    ) -> AgentState {
        let turn_start = std::time::Instant::now();
        let cm_start = TraceRecord::new(GraphNode::ConversationManager.name(), "started", serde_json::json!({}));
        state.trace(cm_start.clone());
        sink.on_event(ServerEvent::NodeStarted { node: GraphNode::ConversationManager.name().into() }).await;
        conversation_manager::run(&mut state, &self.ctx).await;
        let cm_end = TraceRecord::new(GraphNode::ConversationManager.name(), "completed", serde_json::json!({}));
        state.trace(cm_end.clone());
        sink.on_event(ServerEvent::NodeCompleted {
            node: GraphNode::ConversationManager.name().into(),
            duration_ms: derive_duration_ms(&cm_start, &cm_end),
        })
        .await;

        loop {
            let start = TraceRecord::new(GraphNode::StrategicPlanner.name(), "started", serde_json::json!({}));
            state.trace(start.clone());
            sink.on_event(ServerEvent::NodeStarted { node: GraphNode::StrategicPlanner.name().into() }).await;
            strategic_planner::run(&mut state, &self.ctx).await;
            let end = TraceRecord::new(GraphNode::StrategicPlanner.name(), "completed", serde_json::json!({}));
            state.trace(end.clone());
            sink.on_event(ServerEvent::NodeCompleted {
                node: GraphNode::StrategicPlanner.name().into(),
                duration_ms: derive_duration_ms(&start, &end),
            })
            .await;

            let agent_ctx = self.ctx.agent_context(search.clone(), extract.clone());
            let start = TraceRecord::new(GraphNode::ToolExecutor.name(), "started", serde_json::json!({}));
            state.trace(start.clone());
            sink.on_event(ServerEvent::NodeStarted { node: GraphNode::ToolExecutor.name().into() }).await;
            tool_executor::run(&mut state, &self.ctx, &agent_ctx, sink).await;
            let end = TraceRecord::new(GraphNode::ToolExecutor.name(), "completed", serde_json::json!({}));
            state.trace(end.clone());
            sink.on_event(ServerEvent::NodeCompleted {
                node: GraphNode::ToolExecutor.name().into(),
                duration_ms: derive_duration_ms(&start, &end),
            })
            .await;

            let start = TraceRecord::new(GraphNode::DecisionGate.name(), "started", serde_json::json!({}));
            state.trace(start.clone());
            let decision = decision_gate::run(&mut state, self.ctx.config.max_iterations);
            let end = TraceRecord::new(GraphNode::DecisionGate.name(), "completed", serde_json::json!({"decision": format!("{:?}", decision)}));
            state.trace(end.clone());
            sink.on_event(ServerEvent::NodeCompleted {
                node: GraphNode::DecisionGate.name().into(),
                duration_ms: derive_duration_ms(&start, &end),
            })
            .await;

            match decision {
                GateDecision::Iterate => continue,
                GateDecision::Proceed => break,
            }
        }

        let start = TraceRecord::new(GraphNode::ResponseSynthesizer.name(), "started", serde_json::json!({}));
        state.trace(start.clone());
        sink.on_event(ServerEvent::NodeStarted { node: GraphNode::ResponseSynthesizer.name().into() }).await;
        let confidence = response_synthesizer::run(&mut state, &self.ctx).await;
        let end = TraceRecord::new(GraphNode::ResponseSynthesizer.name(), "completed", serde_json::json!({"ok": confidence.is_some()}));
        state.trace(end.clone());
        sink.on_event(ServerEvent::NodeCompleted {
            node: GraphNode::ResponseSynthesizer.name().into(),
            duration_ms: derive_duration_ms(&start, &end),
        })
        .await;

        let confidence = match confidence {
            Some(c) => c,
            None => {
                sink.on_event(ServerEvent::Error { reason: "synthesis_failure".into() }).await;
                return state;
            }
        };

        if !state.citations.is_empty() {
            sink.on_event(ServerEvent::CitationsAvailable { citations: state.citations.clone() }).await;
        }

        sink.on_event(ServerEvent::ResponseToken { token: state.final_response.clone() }).await;

        let start = TraceRecord::new(GraphNode::ArtifactDecision.name(), "started", serde_json::json!({}));
        state.trace(start.clone());
        artifact_decision::run(&mut state, &self.ctx).await;
        let end = TraceRecord::new(GraphNode::ArtifactDecision.name(), "completed", serde_json::json!({}));
        state.trace(end.clone());
        sink.on_event(ServerEvent::NodeCompleted {
            node: GraphNode::ArtifactDecision.name().into(),
            duration_ms: derive_duration_ms(&start, &end),
        })
        .await;

        let should_create = state.artifact_decision.as_ref().map(|d| d.should_create).unwrap_or(false);
        if should_create {
            let start = TraceRecord::new(GraphNode::ArtifactCreator.name(), "started", serde_json::json!({}));
            state.trace(start.clone());
            artifact_creator::run(&mut state, &self.ctx).await;
            let end = TraceRecord::new(GraphNode::ArtifactCreator.name(), "completed", serde_json::json!({}));
            state.trace(end.clone());
            sink.on_event(ServerEvent::NodeCompleted {
                node: GraphNode::ArtifactCreator.name().into(),
                duration_ms: derive_duration_ms(&start, &end),
            })
            .await;
            if let Some(artifact) = state.artifact.clone() {
                sink.on_event(ServerEvent::ArtifactReady { artifact }).await;
            }
        }

        let tools_used: Vec<String> = state
            .tool_results
            .keys()
            .chain(state.sub_agent_results.keys())
            .cloned()
            .collect();
        sink.on_event(ServerEvent::Complete {
            query_fingerprint: crate::fingerprint::fingerprint(&state.user_query, None),
            confidence,
            tools_used,
            duration_ms: turn_start.elapsed().as_millis() as i64,
        })
        .await;

        state
    }
}
