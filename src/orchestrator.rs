//! Top-level session lifecycle: validates the incoming query, consults the
//! fingerprint cache, drives the master graph when there's no cache hit,
//! and persists the query record and execution log through the injected
//! `RecordStore`. Owns a turn's lifetime end to end, the way a session
//! object owns one LLM round trip, generalized to "one graph turn".

use std::sync::Arc;

use crate::cache::{CachedOutcome, FingerprintCache};
use crate::config::WorkbenchConfig;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::events::{EventSink, ServerEvent};
use crate::master::{MasterGraph, NodeContext};
use crate::model::{AgentState, Query, QueryStatus, Turn};
use crate::services::record_store::RecordStore;
use crate::services::{ExtractClient, SearchClient};

/// Owns one orchestrator instance: the master graph's shared context, the
/// fingerprint cache (inert when `config.cache_enabled` is false), and the
/// record store queries and traces are persisted through.
pub struct Orchestrator {
    ctx: NodeContext,
    graph: MasterGraph,
    search: Arc<dyn SearchClient>,
    extract: Arc<dyn ExtractClient>,
    record_store: Arc<dyn RecordStore>,
    cache: FingerprintCache,
    config: WorkbenchConfig,
}

impl Orchestrator {
    pub fn new(
        ctx: NodeContext,
        search: Arc<dyn SearchClient>,
        extract: Arc<dyn ExtractClient>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        let config = ctx.config.clone();
        let cache = FingerprintCache::new(config.cache_ttl);
        let graph = MasterGraph::new(ctx.clone());
        Self { ctx, graph, search, extract, record_store, cache, config }
    }

    fn validate(&self, query_text: &str) -> WorkbenchResult<()> {
        if query_text.trim().is_empty() {
            return Err(WorkbenchError::Validation("query must not be empty".into()));
        }
        if query_text.chars().count() > self.config.max_query_len {
            return Err(WorkbenchError::Validation(format!(
                "query exceeds max length of {} characters",
                self.config.max_query_len
            )));
        }
        Ok(())
    }

    /// Run one turn. `history` is the session's prior turns, already bounded
    /// by the caller's `Session`; this call appends the user/assistant turns
    /// for this exchange.
    pub async fn run_turn(
        &self,
        query_text: &str,
        user_session: &str,
        history: Vec<Turn>,
        sink: &dyn EventSink,
    ) -> WorkbenchResult<Query> {
        self.validate(query_text)?;

        let mut query = Query::new(query_text, user_session);
        self.record_store
            .append_trace(user_session, crate::model::TraceRecord::new("query_received", "started", serde_json::json!({"fingerprint": query.fingerprint})))
            .await
            .map_err(|e| WorkbenchError::PersistenceFailure(e.to_string()))?;

        let mut state = AgentState::new(query_text, self.config.max_iterations);
        state.message_history = history;

        // Conversation manager always runs first; the cache short-circuit
        // happens right after it, never before.
        crate::master::conversation_manager::run(&mut state, &self.ctx).await;

        if self.config.cache_enabled {
            if let Some(cached) = self.cache.get(&query.fingerprint).await {
                return Ok(self.serve_cached(&mut query, cached, sink).await);
            }
        }

        let turn_start = std::time::Instant::now();
        let final_state = self.graph.run(state, self.search.clone(), self.extract.clone(), sink).await;
        query.timings.total_ms = turn_start.elapsed().as_millis() as i64;

        let succeeded = !final_state.final_response.is_empty();
        query.status = if succeeded { QueryStatus::Completed } else { QueryStatus::Failed };
        query.tools_used = final_state.tool_results.keys().chain(final_state.sub_agent_results.keys()).cloned().collect();

        if succeeded && self.config.cache_enabled {
            self.cache
                .put(
                    query.fingerprint.clone(),
                    CachedOutcome {
                        response: final_state.final_response.clone(),
                        citations: final_state.citations.clone(),
                        artifact: final_state.artifact.clone(),
                    },
                )
                .await;
        }

        for record in &final_state.execution_log {
            let _ = self.record_store.append_trace(user_session, record.clone()).await;
        }

        Ok(query)
    }

    async fn serve_cached(&self, query: &mut Query, cached: CachedOutcome, sink: &dyn EventSink) -> Query {
        if !cached.citations.is_empty() {
            sink.on_event(ServerEvent::CitationsAvailable { citations: cached.citations.clone() }).await;
        }
        if let Some(artifact) = cached.artifact.clone() {
            sink.on_event(ServerEvent::ArtifactReady { artifact }).await;
        }
        sink.on_event(ServerEvent::ResponseToken { token: cached.response.clone() }).await;
        query.status = QueryStatus::Completed;
        query.confidence = 1.0;
        sink.on_event(ServerEvent::Complete {
            query_fingerprint: query.fingerprint.clone(),
            confidence: query.confidence,
            tools_used: query.tools_used.clone(),
            duration_ms: 0,
        })
        .await;
        query.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::services::extract::test_doubles::FixedExtractClient;
    use crate::services::llm::test_doubles::ScriptedLlmClient;
    use crate::services::record_store::test_doubles::InMemoryRecordStore;
    use crate::services::search::test_doubles::FixedSearchClient;

    fn test_orchestrator(llm_response: &str) -> Orchestrator {
        let ctx = NodeContext {
            llm: Arc::new(ScriptedLlmClient::new(llm_response)),
            tools: crate::tools::ToolRegistry::new(),
            subagents: Arc::new(crate::subagents::SubAgentRegistry::with_builtins()),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            config: WorkbenchConfig::default(),
        };
        Orchestrator::new(
            ctx,
            Arc::new(FixedSearchClient { results: vec![] }),
            Arc::new(FixedExtractClient { pages: vec![] }),
            Arc::new(InMemoryRecordStore::new()),
        )
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_node_runs() {
        let orchestrator = test_orchestrator("{}");
        let result = orchestrator.run_turn("   ", "session-1", vec![], &NullSink).await;
        assert!(matches!(result, Err(WorkbenchError::Validation(_))));
    }

    #[tokio::test]
    async fn over_length_query_is_rejected() {
        let orchestrator = test_orchestrator("{}");
        let too_long = "a".repeat(2001);
        let result = orchestrator.run_turn(&too_long, "session-1", vec![], &NullSink).await;
        assert!(matches!(result, Err(WorkbenchError::Validation(_))));
    }

    #[tokio::test]
    async fn cache_disabled_by_default_runs_full_graph_each_time() {
        let orchestrator = test_orchestrator(r#"{"can_answer_directly": true, "tools_to_use": [], "reasoning": "direct", "expected_entities": []}"#);
        let result = orchestrator.run_turn("what is the capital of france", "session-1", vec![], &NullSink).await;
        // The planner response above doesn't satisfy the synthesizer's schema,
        // so synthesis fails fatally; the important assertion is that
        // validation passed and the graph actually ran (no panic, no cache hit).
        assert!(result.is_ok());
    }
}
