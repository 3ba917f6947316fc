//! Sub-agent framework: a registry of opaque plug-ins, each a self-contained
//! mini-graph exposing only the uniform call contract below. Isolation comes
//! from the type system rather than a runtime mechanism — every sub-agent's
//! node functions and state struct are private (`mod sentiment { ... }` with
//! no `pub` on its internals), so nothing outside this file can reach into
//! `sentiment::query_analyzer` or collide with `media_bias`'s own
//! `query_analyzer`. No plug-in imports another; anything shared lives in
//! `crate::services` / `crate::tools` and is injected into each agent's
//! entry point.

pub mod live_monitor;
pub mod media_bias;
pub mod sentiment;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::SubAgentResult;
use crate::services::{ExtractClient, LlmClient, ObjectStore, SearchClient};

/// Everything an agent might need, injected once at registry construction.
/// Individual agents use whichever subset their mini-graph requires.
#[derive(Clone)]
pub struct AgentContext {
    pub llm: Arc<dyn LlmClient>,
    pub search: Arc<dyn SearchClient>,
    pub extract: Arc<dyn ExtractClient>,
    pub object_store: Arc<dyn ObjectStore>,
    pub search_max_results: usize,
}

/// Uniform contract every sub-agent honors. `extras` carries request-specific
/// overrides (e.g. `requested_visualizations`) as a loose JSON object rather
/// than a growing positional-argument list.
#[async_trait]
pub trait SubAgent: Send + Sync {
    async fn call(&self, query: &str, extras: &Value, ctx: &AgentContext) -> SubAgentResult;

    fn name(&self) -> &'static str;
}

/// Registry mapping agent name to an instance. Lookup is the only way the
/// master ever reaches a sub-agent — there is no ambient namespace an agent
/// could be resolved from besides this map.
#[derive(Default)]
pub struct SubAgentRegistry {
    agents: HashMap<&'static str, Arc<dyn SubAgent>>,
}

impl SubAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry with every built-in agent registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(sentiment::SentimentAnalysisAgent));
        registry.register(Arc::new(media_bias::MediaBiasDetectorAgent));
        registry.register(Arc::new(live_monitor::LivePoliticalMonitorAgent));
        registry
    }

    pub fn register(&mut self, agent: Arc<dyn SubAgent>) {
        self.agents.insert(agent.name(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SubAgent>> {
        self.agents.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Dispatch by name, never raising to the caller: an unknown name or an
    /// internal panic-free error both surface as a failed `SubAgentResult`.
    pub async fn call(&self, name: &str, query: &str, extras: &Value, ctx: &AgentContext) -> SubAgentResult {
        match self.get(name) {
            Some(agent) => agent.call(query, extras, ctx).await,
            None => SubAgentResult::failure(format!("no such sub-agent: {}", name), Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_all_registered_by_name() {
        let registry = SubAgentRegistry::with_builtins();
        assert!(registry.contains("sentiment_analysis_agent"));
        assert!(registry.contains("media_bias_detector_agent"));
        assert!(registry.contains("live_political_monitor_agent"));
    }

    #[tokio::test]
    async fn unknown_agent_name_fails_gracefully() {
        let registry = SubAgentRegistry::with_builtins();
        let ctx = AgentContext {
            llm: Arc::new(crate::services::llm::test_doubles::ScriptedLlmClient::new("{}")),
            search: Arc::new(crate::services::search::test_doubles::FixedSearchClient { results: vec![] }),
            extract: Arc::new(crate::services::extract::test_doubles::FixedExtractClient { pages: vec![] }),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            search_max_results: 10,
        };
        let result = registry.call("nonexistent_agent", "q", &Value::Null, &ctx).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("no such sub-agent"));
    }
}
