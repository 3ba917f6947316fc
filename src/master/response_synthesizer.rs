//! Response Synthesizer: the one node whose failure is fatal for the turn.
//! Produces final prose plus deduplicated, relevance-ordered citations and
//! a confidence estimate blending source agreement with sub-agent
//! confidences.

use serde::Deserialize;

use crate::master::NodeContext;
use crate::model::{dedupe_citations, AgentState, Citation};
use crate::services::llm::{LlmCallOptions, LlmMessage, LlmResponse};

const SYNTHESIZER_SYSTEM_PROMPT: &str = r#"You are the response synthesizer for a political research assistant. \
Using the provided tool and sub-agent results, write a final answer to the user's query. Paraphrase sources; \
quote no more than a short span verbatim. Attribute every factual claim to a citation index like [1]. \
If sources disagree or data is missing, say so explicitly and lower your confidence. Respond with strict JSON:
{"response": string, "citations": [{"url": string, "title": string, "snippet": string, "score": float}], "confidence": float}
"#;

#[derive(Deserialize)]
struct RawSynthesis {
    response: String,
    #[serde(default)]
    citations: Vec<RawCitation>,
    confidence: f32,
}

#[derive(Deserialize)]
struct RawCitation {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    score: f32,
}

/// Returns the blended confidence on success; `None` is fatal for the turn.
/// Confidence is not a field of `AgentState` — it is surfaced here and
/// threaded by the orchestrator onto `Query::confidence` and the
/// `complete` event.
pub async fn run(state: &mut AgentState, ctx: &NodeContext) -> Option<f32> {
    let history_tail: Vec<String> = state
        .message_history
        .iter()
        .rev()
        .take(10)
        .map(|t| format!("{:?}: {}", t.role, t.content))
        .collect();

    let sub_agent_confidences: Vec<f32> = state.sub_agent_results.values().map(|r| r.confidence).collect();

    let prompt = serde_json::json!({
        "query": state.user_query,
        "tool_results": state.tool_results,
        "sub_agent_results": state.sub_agent_results.iter().map(|(k, v)| (k.clone(), v.data.clone())).collect::<std::collections::HashMap<_, _>>(),
        "history_tail": history_tail,
        "prior_errors": state.error_log,
    });

    let messages = vec![
        LlmMessage::system(SYNTHESIZER_SYSTEM_PROMPT),
        LlmMessage::user(prompt.to_string()),
    ];

    let response = ctx
        .llm
        .send_message_with_options(&messages, LlmCallOptions { temperature: 0.2, json_mode: true })
        .await;

    match response {
        Ok(LlmResponse { content, .. }) => match serde_json::from_str::<RawSynthesis>(&content) {
            Ok(parsed) => {
                let mut citations: Vec<Citation> = state.citations.clone();
                citations.extend(
                    parsed
                        .citations
                        .into_iter()
                        .map(|c| Citation::new(c.url, c.title, c.snippet, c.score)),
                );
                let mut deduped = dedupe_citations(citations);
                deduped.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

                let agreement_confidence = parsed.confidence.clamp(0.0, 1.0);
                let blended_confidence = if sub_agent_confidences.is_empty() {
                    agreement_confidence
                } else {
                    let mean_sub_agent = sub_agent_confidences.iter().sum::<f32>() / sub_agent_confidences.len() as f32;
                    ((agreement_confidence + mean_sub_agent) / 2.0).clamp(0.0, 1.0)
                };

                state.final_response = parsed.response;
                state.citations = deduped;
                Some(blended_confidence)
            }
            Err(e) => {
                state.record_error(format!("response_synthesizer: could not parse synthesis JSON: {}", e));
                None
            }
        },
        Err(e) => {
            state.record_error(format!("response_synthesizer: LLM call failed: {}", e));
            None
        }
    }
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
    async fn successful_synthesis_sets_final_response_and_citations() {
        let response = r#"{"response": "Answer text [1].", "citations": [{"url": "https://a.com", "title": "A", "snippet": "s", "score": 0.9}], "confidence": 0.8}"#;
        let ctx = ctx_with_response(response);
        let mut state = AgentState::new("q", 3);
        let confidence = run(&mut state, &ctx).await;
        assert!(confidence.is_some());
        assert_eq!(state.final_response, "Answer text [1].");
        assert_eq!(state.citations.len(), 1);
    }

    #[tokio::test]
    async fn unparsable_response_is_fatal() {
        let ctx = ctx_with_response("not json");
        let mut state = AgentState::new("q", 3);
        let confidence = run(&mut state, &ctx).await;
        assert!(confidence.is_none());
        assert!(state.final_response.is_empty());
    }

    #[tokio::test]
    async fn existing_citations_are_deduplicated_against_llm_citations() {
        let response = r#"{"response": "text", "citations": [{"url": "https://a.com", "title": "dup", "snippet": "s", "score": 0.5}], "confidence": 0.5}"#;
        let ctx = ctx_with_response(response);
        let mut state = AgentState::new("q", 3);
        state.citations.push(Citation::new("https://a.com", "first", "s", 0.9));
        run(&mut state, &ctx).await;
        assert_eq!(state.citations.len(), 1);
        assert_eq!(state.citations[0].title, "first");
    }
}
