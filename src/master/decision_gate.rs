//! Decision Gate: pure logic, no LLM call. Decides whether to proceed to
//! synthesis or loop back to the planner.

use crate::master::GateDecision;
use crate::model::AgentState;

pub fn run(state: &mut AgentState, max_iterations: usize) -> GateDecision {
    if state.iteration >= max_iterations {
        return GateDecision::Proceed;
    }
    if state.plan.can_answer_directly {
        return GateDecision::Proceed;
    }

    let has_non_empty_result = state.tool_results.values().any(|v| !v.is_null())
        || state.sub_agent_results.values().any(|r| r.success);
    let planner_wants_another_pass = state.plan.reasoning.contains("INSUFFICIENT");
    if has_non_empty_result && !planner_wants_another_pass {
        return GateDecision::Proceed;
    }

    let all_selected_failed = !state.plan.tools_to_use.is_empty()
        && state.plan.tools_to_use.iter().all(|name| {
            state
                .tool_results
                .get(name)
                .map(|v| v.is_null())
                .or_else(|| state.sub_agent_results.get(name).map(|r| !r.success))
                .unwrap_or(true)
        });
    if all_selected_failed {
        return GateDecision::Proceed;
    }

    if state.plan.tools_to_use.is_empty() && !state.plan.can_answer_directly {
        return GateDecision::Proceed;
    }

    state.iteration += 1;
    GateDecision::Iterate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Plan;

    #[test]
    fn proceeds_at_max_iterations_regardless_of_plan() {
        let mut state = AgentState::new("q", 3);
        state.iteration = 3;
        state.plan = Plan { can_answer_directly: false, tools_to_use: vec!["tavily_search".into()], reasoning: String::new(), expected_entities: vec![] };
        assert_eq!(run(&mut state, 3), GateDecision::Proceed);
    }

    #[test]
    fn proceeds_when_can_answer_directly() {
        let mut state = AgentState::new("q", 3);
        state.plan = Plan { can_answer_directly: true, tools_to_use: vec![], reasoning: String::new(), expected_entities: vec![] };
        assert_eq!(run(&mut state, 3), GateDecision::Proceed);
    }

    #[test]
    fn proceeds_on_successful_result_without_insufficient_token() {
        let mut state = AgentState::new("q", 3);
        state.plan = Plan { can_answer_directly: false, tools_to_use: vec!["tavily_search".into()], reasoning: "looks complete".into(), expected_entities: vec![] };
        state.tool_results.insert("tavily_search".into(), serde_json::json!({"ok": true}));
        assert_eq!(run(&mut state, 3), GateDecision::Proceed);
    }

    #[test]
    fn iterates_when_planner_flags_insufficient() {
        let mut state = AgentState::new("q", 3);
        state.plan = Plan { can_answer_directly: false, tools_to_use: vec!["tavily_search".into()], reasoning: "INSUFFICIENT data".into(), expected_entities: vec![] };
        state.tool_results.insert("tavily_search".into(), serde_json::json!({"ok": true}));
        assert_eq!(run(&mut state, 3), GateDecision::Iterate);
        assert_eq!(state.iteration, 1);
    }

    #[test]
    fn proceeds_when_all_selected_tools_failed() {
        let mut state = AgentState::new("q", 3);
        state.plan = Plan { can_answer_directly: false, tools_to_use: vec!["tavily_search".into()], reasoning: String::new(), expected_entities: vec![] };
        state.tool_results.insert("tavily_search".into(), serde_json::Value::Null);
        assert_eq!(run(&mut state, 3), GateDecision::Proceed);
    }

    #[test]
    fn proceeds_when_plan_is_empty_and_cannot_answer_directly() {
        let mut state = AgentState::new("q", 3);
        state.plan = Plan { can_answer_directly: false, tools_to_use: vec![], reasoning: String::new(), expected_entities: vec![] };
        assert_eq!(run(&mut state, 3), GateDecision::Proceed);
    }
}
