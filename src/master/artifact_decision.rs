//! Artifact Decision: one LLM call deciding whether this turn should
//! produce a master-level visualization, and if so, of which type. At most
//! one master-level artifact is produced per turn even when sub-agents
//! already attached their own.

use serde::Deserialize;

use crate::master::NodeContext;
use crate::model::{AgentState, ArtifactDecision, ArtifactType};
use crate::services::llm::{LlmCallOptions, LlmMessage, LlmResponse};

const VISUALIZATION_KEYWORDS: &[&str] = &["map", "chart", "visualize", "plot", "show"];

const ARTIFACT_DECISION_SYSTEM_PROMPT: &str = r#"Decide whether the user's query calls for a visualization. \
Respond with strict JSON:
{"should_create": bool, "chart_type": "bar_chart"|"line_chart"|"map_chart"|"mind_map"|"table"|"radar_chart", "title": string, "data": object|null}
Omit "data" (set it to null) when prior sub-agent results already contain the fields needed to build the chart; \
the creator will extract them."#;

#[derive(Deserialize)]
struct RawDecision {
    should_create: bool,
    #[serde(default = "default_chart_type")]
    chart_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

fn default_chart_type() -> String {
    "table".to_string()
}

fn parse_chart_type(s: &str) -> ArtifactType {
    match s {
        "bar_chart" => ArtifactType::BarChart,
        "line_chart" => ArtifactType::LineChart,
        "map_chart" => ArtifactType::MapChart,
        "radar_chart" => ArtifactType::RadarChart,
        "mind_map" => ArtifactType::MindMap,
        _ => ArtifactType::Table,
    }
}

fn mentions_visualization_intent(query: &str) -> bool {
    let lowered = query.to_lowercase();
    VISUALIZATION_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

pub async fn run(state: &mut AgentState, ctx: &NodeContext) {
    let has_structured_sub_agent_data = state.sub_agent_results.values().any(|r| r.success && !r.data.is_null());
    if !mentions_visualization_intent(&state.user_query) && !has_structured_sub_agent_data {
        state.artifact_decision = Some(ArtifactDecision::default());
        return;
    }

    let prompt = serde_json::json!({
        "query": state.user_query,
        "has_sub_agent_data": has_structured_sub_agent_data,
        "sub_agent_result_keys": state.sub_agent_results.keys().collect::<Vec<_>>(),
    });
    let messages = vec![
        LlmMessage::system(ARTIFACT_DECISION_SYSTEM_PROMPT),
        LlmMessage::user(prompt.to_string()),
    ];

    let response = ctx
        .llm
        .send_message_with_options(&messages, LlmCallOptions { temperature: 0.0, json_mode: true })
        .await;

    let decision = match response {
        Ok(LlmResponse { content, .. }) => match serde_json::from_str::<RawDecision>(&content) {
            Ok(raw) => ArtifactDecision {
                should_create: raw.should_create,
                chart_type: parse_chart_type(&raw.chart_type),
                title: raw.title,
                data: raw.data,
            },
            Err(e) => {
                state.record_error(format!("artifact_decision: could not parse decision JSON: {}", e));
                ArtifactDecision::default()
            }
        },
        Err(e) => {
            state.record_error(format!("artifact_decision: LLM call failed: {}", e));
            ArtifactDecision::default()
        }
    };

    state.artifact_decision = Some(decision);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::test_doubles::ScriptedLlmClient;
    use std::sync::Arc;

    fn ctx_with_response(response: &str) -> NodeContext {
        NodeContext {
            llm: Arc::new(ScriptedLlmClient::new(response)),
            tools: crate::tools::ToolRegistry::new(),
            subagents: Arc::new(crate::subagents::SubAgentRegistry::with_builtins()),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            config: crate::config::WorkbenchConfig::default(),
        }
    }

    #[tokio::test]
    async fn skips_llm_call_when_no_visualization_intent_or_data() {
        let ctx = ctx_with_response("{}");
        let mut state = AgentState::new("what is the capital of france", 3);
        run(&mut state, &ctx).await;
        assert!(!state.artifact_decision.unwrap().should_create);
    }

    #[tokio::test]
    async fn triggers_on_visualization_keyword() {
        let response = r#"{"should_create": true, "chart_type": "map_chart", "title": "Map", "data": null}"#;
        let ctx = ctx_with_response(response);
        let mut state = AgentState::new("create the map visualization for this data", 3);
        run(&mut state, &ctx).await;
        let decision = state.artifact_decision.unwrap();
        assert!(decision.should_create);
        assert_eq!(decision.chart_type, ArtifactType::MapChart);
        assert!(decision.data.is_none());
    }
}
