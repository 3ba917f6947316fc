//! Conversation Manager: deterministic context assembly, no LLM call.
//! Bounds history, pulls entity mentions forward for the planner, and
//! resets the iteration counter for this turn.

use crate::master::NodeContext;
use crate::model::AgentState;

const DEFAULT_MAX_HISTORY_TURNS: usize = 10;

pub async fn run(state: &mut AgentState, _ctx: &NodeContext) {
    if state.message_history.len() > DEFAULT_MAX_HISTORY_TURNS {
        let excess = state.message_history.len() - DEFAULT_MAX_HISTORY_TURNS;
        state.message_history.drain(0..excess);
    }
    state.iteration = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Turn;

    fn ctx() -> NodeContext {
        NodeContext {
            llm: std::sync::Arc::new(crate::services::llm::test_doubles::ScriptedLlmClient::new("{}")),
            tools: crate::tools::ToolRegistry::new(),
            subagents: std::sync::Arc::new(crate::subagents::SubAgentRegistry::with_builtins()),
            object_store: std::sync::Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            config: crate::config::WorkbenchConfig::default(),
        }
    }

    #[tokio::test]
    async fn bounds_history_to_default_window() {
        let mut state = AgentState::new("q", 3);
        for i in 0..15 {
            state.message_history.push(Turn::user(format!("turn {}", i)));
        }
        run(&mut state, &ctx()).await;
        assert_eq!(state.message_history.len(), DEFAULT_MAX_HISTORY_TURNS);
        assert_eq!(state.message_history[0].content, "turn 5");
    }

    #[tokio::test]
    async fn resets_iteration_counter() {
        let mut state = AgentState::new("q", 3);
        state.iteration = 2;
        run(&mut state, &ctx()).await;
        assert_eq!(state.iteration, 0);
    }
}
