//! Tool Executor: dispatches `plan.tools_to_use` concurrently, splitting
//! dispatch between the closed tool registry and the sub-agent registry,
//! merging results into the disjoint `tool_results` / `sub_agent_results`
//! maps. Never retries on its own — retrying is the planner's job via the
//! decision gate's iterate edge.

use futures_util::future::join_all;

use crate::events::{EventSink, ServerEvent};
use crate::master::NodeContext;
use crate::model::AgentState;
use crate::subagents::AgentContext;

enum Dispatch {
    Tool(String, Result<crate::tools::ToolResult, String>),
    SubAgent(String, crate::model::SubAgentResult),
}

pub async fn run(state: &mut AgentState, ctx: &NodeContext, agent_ctx: &AgentContext, sink: &dyn EventSink) {
    let tools_to_use = state.plan.tools_to_use.clone();
    if tools_to_use.is_empty() {
        return;
    }

    for name in &tools_to_use {
        if ctx.tools.contains(name) {
            sink.on_event(ServerEvent::ToolCallStarted { tool: name.clone() }).await;
        } else if ctx.subagents.contains(name) {
            sink.on_event(ServerEvent::SubAgentStarted { agent: name.clone() }).await;
        }
    }

    let query = state.user_query.clone();
    let dispatches = tools_to_use.iter().map(|name| {
        let name = name.clone();
        let query = query.clone();
        async move {
            if let Some(tool) = ctx.tools.get(&name) {
                let input = serde_json::json!({"query": query, "urls": []});
                let outcome = tokio::time::timeout(ctx.config.tool_timeout, tool.execute(input)).await;
                let result = match outcome {
                    Ok(Ok(result)) => Ok(result),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("tool '{}' timed out after {:?}", name, ctx.config.tool_timeout)),
                };
                Dispatch::Tool(name, result)
            } else {
                let outcome = tokio::time::timeout(
                    ctx.config.subagent_timeout,
                    ctx.subagents.call(&name, &query, &serde_json::Value::Null, agent_ctx),
                )
                .await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(_) => crate::model::SubAgentResult::failure(
                        format!("sub-agent '{}' timed out after {:?}", name, ctx.config.subagent_timeout),
                        Vec::new(),
                    ),
                };
                Dispatch::SubAgent(name, result)
            }
        }
    });

    for dispatch in join_all(dispatches).await {
        match dispatch {
            Dispatch::Tool(name, Ok(result)) => {
                sink.on_event(ServerEvent::ToolCallCompleted { tool: name.clone(), success: result.success }).await;
                if !result.success {
                    state.error_log.push(format!("tool '{}' failed: {}", name, result.error.clone().unwrap_or_default()));
                }
                if let Some(citations) = extract_citations(&result.output) {
                    state.citations.extend(citations);
                }
                state.tool_results.insert(name, result.output);
            }
            Dispatch::Tool(name, Err(e)) => {
                sink.on_event(ServerEvent::ToolCallCompleted { tool: name.clone(), success: false }).await;
                state.error_log.push(format!("tool '{}' failed: {}", name, e));
            }
            Dispatch::SubAgent(name, result) => {
                sink.on_event(ServerEvent::SubAgentCompleted {
                    agent: name.clone(),
                    success: result.success,
                    confidence: result.confidence,
                })
                .await;
                if !result.success {
                    state.error_log.push(format!("sub-agent '{}' failed: {}", name, result.error.clone().unwrap_or_default()));
                }
                for artifact in &result.artifacts {
                    sink.on_event(ServerEvent::ArtifactReady { artifact: artifact.clone() }).await;
                }
                state.sub_agent_results.insert(name, result);
            }
        }
    }

    state.assert_key_disjoint_invariant();
}

/// `tavily_search` results carry a `results` array of `{url,title,snippet,score}`.
fn extract_citations(output: &serde_json::Value) -> Option<Vec<crate::model::Citation>> {
    let array = output.as_array()?;
    let citations = array
        .iter()
        .filter_map(|item| {
            Some(crate::model::Citation::new(
                item.get("url")?.as_str()?,
                item.get("title").and_then(|v| v.as_str()).unwrap_or_default(),
                item.get("snippet").and_then(|v| v.as_str()).unwrap_or_default(),
                item.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
            ))
        })
        .collect::<Vec<_>>();
    if citations.is_empty() {
        None
    } else {
        Some(citations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkbenchConfig;
    use crate::events::NullSink;
    use crate::model::Plan;
    use crate::services::llm::test_doubles::ScriptedLlmClient;
    use crate::services::search::test_doubles::FixedSearchClient;
    use crate::services::extract::test_doubles::FixedExtractClient;
    use crate::services::search::SearchResult;
    use std::sync::Arc;

    fn node_ctx() -> NodeContext {
        let mut tools = crate::tools::ToolRegistry::new();
        tools.register(Arc::new(crate::tools::tavily_search::TavilySearchTool::new(
            Arc::new(FixedSearchClient {
                results: vec![SearchResult { url: "https://a.com".into(), title: "A".into(), snippet: "s".into(), score: 0.8 }],
            }),
            10,
        )));
        NodeContext {
            llm: Arc::new(ScriptedLlmClient::new("{}")),
            tools,
            subagents: Arc::new(crate::subagents::SubAgentRegistry::with_builtins()),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            config: WorkbenchConfig::default(),
        }
    }

    fn agent_ctx() -> AgentContext {
        AgentContext {
            llm: Arc::new(ScriptedLlmClient::new("{}")),
            search: Arc::new(FixedSearchClient { results: vec![] }),
            extract: Arc::new(FixedExtractClient { pages: vec![] }),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            search_max_results: 10,
        }
    }

    #[tokio::test]
    async fn dispatches_known_tool_and_populates_citations() {
        let ctx = node_ctx();
        let agent_ctx = agent_ctx();
        let mut state = AgentState::new("nato expansion", 3);
        state.plan = Plan { can_answer_directly: false, tools_to_use: vec!["tavily_search".into()], reasoning: String::new(), expected_entities: vec![] };
        run(&mut state, &ctx, &agent_ctx, &NullSink).await;
        assert!(state.tool_results.contains_key("tavily_search"));
        assert_eq!(state.citations.len(), 1);
        assert!(state.sub_agent_results.is_empty());
    }

    #[tokio::test]
    async fn empty_plan_is_a_no_op() {
        let ctx = node_ctx();
        let agent_ctx = agent_ctx();
        let mut state = AgentState::new("q", 3);
        run(&mut state, &ctx, &agent_ctx, &NullSink).await;
        assert!(state.tool_results.is_empty());
        assert!(state.sub_agent_results.is_empty());
    }
}
