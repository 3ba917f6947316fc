//! Strategic Planner: one temperature-0, JSON-mode LLM call that decides
//! whether the query can be answered directly and, if not, which tools to
//! dispatch. The selection rules are embedded here as the system message —
//! they are authoritative, so they live in code, not in a user-editable
//! template.

use serde::Deserialize;

use crate::master::NodeContext;
use crate::model::{AgentState, Plan};
use crate::services::llm::{LlmCallOptions, LlmMessage, LlmResponse};

const PLANNER_SYSTEM_PROMPT: &str = r#"You are the strategic planner for a political research assistant. \
Given the user's query and any prior tool/sub-agent results, decide how to proceed. Respond with strict JSON:
{"can_answer_directly": bool, "tools_to_use": [string], "reasoning": string, "expected_entities": [string]}

Rules (authoritative):
- If prior results already contain the data the user now wants *visualized* (keywords: "map", "chart", "visualize", "plot", "show"), set can_answer_directly=true and tools_to_use=[]. Do not re-run analysis.
- If the query names countries plus a political subject and no prior sentiment data exists, select "sentiment_analysis_agent".
- If the query asks for bias/framing comparison across named outlets, select "media_bias_detector_agent".
- If the query asks about current/breaking/explosive events, select "tavily_search" and optionally "live_political_monitor_agent".
- Otherwise select "tavily_search" and/or "tavily_extract".
- If you believe another pass is needed after seeing partial results, include the token "INSUFFICIENT" in reasoning.
"#;

#[derive(Deserialize)]
struct RawPlan {
    can_answer_directly: bool,
    #[serde(default)]
    tools_to_use: Vec<String>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    expected_entities: Vec<String>,
}

pub async fn run(state: &mut AgentState, ctx: &NodeContext) {
    let prior_results = serde_json::json!({
        "tool_results": state.tool_results,
        "sub_agent_results": state.sub_agent_results.keys().collect::<Vec<_>>(),
    });
    let messages = vec![
        LlmMessage::system(PLANNER_SYSTEM_PROMPT),
        LlmMessage::user(format!("Query: {}\nPrior results: {}", state.user_query, prior_results)),
    ];

    let response = ctx
        .llm
        .send_message_with_options(&messages, LlmCallOptions { temperature: 0.0, json_mode: true })
        .await;

    let plan = match response {
        Ok(LlmResponse { content, .. }) => match serde_json::from_str::<RawPlan>(&content) {
            Ok(raw) => validate_plan(raw, ctx, state),
            Err(e) => {
                state.record_error(format!("strategic_planner: could not parse plan JSON: {}", e));
                Plan::default()
            }
        },
        Err(e) => {
            state.record_error(format!("strategic_planner: LLM call failed: {}", e));
            Plan::default()
        }
    };

    state.plan = plan;
}

/// Drop tool names that are not in the closed registry, with a warning
/// recorded to `error_log` rather than trusted blindly.
fn validate_plan(raw: RawPlan, ctx: &NodeContext, state: &mut AgentState) -> Plan {
    let mut valid_tools = Vec::new();
    for tool in raw.tools_to_use {
        if ctx.tools.contains(&tool) || ctx.subagents.contains(&tool) {
            valid_tools.push(tool);
        } else {
            state.record_error(format!("strategic_planner: discarding unknown tool '{}'", tool));
        }
    }
    Plan {
        can_answer_directly: raw.can_answer_directly,
        tools_to_use: valid_tools,
        reasoning: raw.reasoning,
        expected_entities: raw.expected_entities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::test_doubles::ScriptedLlmClient;
    use std::sync::Arc;

    fn ctx_with_response(response: &str) -> NodeContext {
        let mut tools = crate::tools::ToolRegistry::new();
        tools.register(Arc::new(crate::tools::tavily_search::TavilySearchTool::new(
            Arc::new(crate::services::search::test_doubles::FixedSearchClient { results: vec![] }),
            10,
        )));
        NodeContext {
            llm: Arc::new(ScriptedLlmClient::new(response)),
            tools,
            subagents: Arc::new(crate::subagents::SubAgentRegistry::with_builtins()),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            config: crate::config::WorkbenchConfig::default(),
        }
    }

    #[tokio::test]
    async fn unknown_tool_names_are_filtered_out() {
        let response = r#"{"can_answer_directly": false, "tools_to_use": ["tavily_search", "made_up_tool"], "reasoning": "", "expected_entities": []}"#;
        let ctx = ctx_with_response(response);
        let mut state = AgentState::new("q", 3);
        run(&mut state, &ctx).await;
        assert_eq!(state.plan.tools_to_use, vec!["tavily_search".to_string()]);
        assert!(state.error_log.iter().any(|e| e.contains("made_up_tool")));
    }

    #[tokio::test]
    async fn unparsable_response_falls_back_to_default_plan() {
        let ctx = ctx_with_response("not json");
        let mut state = AgentState::new("q", 3);
        run(&mut state, &ctx).await;
        assert!(!state.plan.can_answer_directly);
        assert!(state.plan.tools_to_use.is_empty());
        assert!(!state.error_log.is_empty());
    }

    #[tokio::test]
    async fn sub_agent_names_are_accepted_as_valid_tools() {
        let response = r#"{"can_answer_directly": false, "tools_to_use": ["sentiment_analysis_agent"], "reasoning": "", "expected_entities": []}"#;
        let ctx = ctx_with_response(response);
        let mut state = AgentState::new("q", 3);
        run(&mut state, &ctx).await;
        assert_eq!(state.plan.tools_to_use, vec!["sentiment_analysis_agent".to_string()]);
    }
}
