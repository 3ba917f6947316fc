//! Artifact Creator: resolves the chart-decision payload into concrete
//! bytes, normalizes map-chart countries, and persists every format through
//! the injected `ObjectStore`. No LLM call — this node is pure data
//! transformation plus I/O.

use crate::master::NodeContext;
use crate::model::{AgentState, Artifact, ArtifactType};
use crate::visualization::{export, extract};

pub async fn run(state: &mut AgentState, ctx: &NodeContext) {
    let decision = match state.artifact_decision.clone() {
        Some(d) if d.should_create => d,
        _ => return,
    };

    let chart = extract::extract_chart_data(decision.chart_type, decision.data.as_ref(), &state.sub_agent_results);
    let artifact_id = Artifact::compute_id(decision.chart_type, &chart.data);

    let html = match export::render_html(&decision.title, decision.chart_type, &chart.data) {
        Ok(bytes) => bytes,
        Err(e) => {
            state.record_error(format!("artifact_creator: html render failed: {}", e));
            return;
        }
    };
    let json = export::render_json(&decision.title, decision.chart_type, &chart.data);
    let xlsx = if decision.chart_type == ArtifactType::Table {
        match export::render_xlsx(&chart.data) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                // XLSX export is best-effort; failure here does not fail
                // the artifact as a whole.
                state.record_error(format!("artifact_creator: xlsx render failed: {}", e));
                None
            }
        }
    } else {
        None
    };

    let mut format_paths = std::collections::HashMap::new();
    match ctx.object_store.put(&format!("artifacts/{}/chart.html", artifact_id), &html).await {
        Ok(uri) => {
            format_paths.insert("html".to_string(), uri);
        }
        Err(e) => {
            state.record_error(format!("artifact_creator: could not persist html: {}", e));
            return;
        }
    }
    if let Ok(uri) = ctx.object_store.put(&format!("artifacts/{}/data.json", artifact_id), &json).await {
        format_paths.insert("json".to_string(), uri);
    }
    if let Some(xlsx_bytes) = &xlsx {
        if let Ok(uri) = ctx.object_store.put(&format!("artifacts/{}/table.xlsx", artifact_id), xlsx_bytes).await {
            format_paths.insert("xlsx".to_string(), uri);
        }
    }

    let metadata = serde_json::json!({
        "skipped_countries": chart.skipped_countries,
        "source": if decision.data.is_some() { "decision" } else { "sub_agent_extraction" },
    });

    state.artifact = Some(Artifact {
        artifact_id,
        artifact_type: decision.chart_type,
        title: decision.title,
        format_paths,
        metadata,
        created_at: chrono::Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArtifactDecision;
    use crate::services::llm::test_doubles::ScriptedLlmClient;
    use std::sync::Arc;

    fn ctx() -> NodeContext {
        NodeContext {
            llm: Arc::new(ScriptedLlmClient::new("{}")),
            tools: crate::tools::ToolRegistry::new(),
            subagents: Arc::new(crate::subagents::SubAgentRegistry::with_builtins()),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            config: crate::config::WorkbenchConfig::default(),
        }
    }

    #[tokio::test]
    async fn creates_map_artifact_with_skipped_countries_recorded() {
        let ctx = ctx();
        let mut state = AgentState::new("create the map visualization for this data", 3);
        state.artifact_decision = Some(ArtifactDecision {
            should_create: true,
            chart_type: ArtifactType::MapChart,
            title: "Sentiment map".into(),
            data: Some(serde_json::json!({"countries": ["Israel", "Wakanda"], "values": [-0.7, 0.1]})),
        });
        run(&mut state, &ctx).await;
        let artifact = state.artifact.expect("artifact created");
        assert_eq!(artifact.artifact_type, ArtifactType::MapChart);
        assert!(artifact.format_paths.contains_key("html"));
        assert_eq!(artifact.metadata["skipped_countries"], serde_json::json!(["Wakanda"]));
    }

    #[tokio::test]
    async fn table_chart_also_produces_xlsx() {
        let ctx = ctx();
        let mut state = AgentState::new("show a table", 3);
        state.artifact_decision = Some(ArtifactDecision {
            should_create: true,
            chart_type: ArtifactType::Table,
            title: "Table".into(),
            data: Some(serde_json::json!({"columns": ["a"], "rows": [["x"]]})),
        });
        run(&mut state, &ctx).await;
        let artifact = state.artifact.expect("artifact created");
        assert!(artifact.format_paths.contains_key("xlsx"));
    }

    #[tokio::test]
    async fn does_nothing_when_decision_declines() {
        let ctx = ctx();
        let mut state = AgentState::new("q", 3);
        state.artifact_decision = Some(ArtifactDecision::default());
        run(&mut state, &ctx).await;
        assert!(state.artifact.is_none());
    }

    #[tokio::test]
    async fn artifact_id_is_idempotent_across_identical_runs() {
        let ctx = ctx();
        let decision = ArtifactDecision {
            should_create: true,
            chart_type: ArtifactType::BarChart,
            title: "Bar".into(),
            data: Some(serde_json::json!({"x": ["a"], "y": [1.0]})),
        };

        let mut first = AgentState::new("q", 3);
        first.artifact_decision = Some(decision.clone());
        run(&mut first, &ctx).await;

        let mut second = AgentState::new("q", 3);
        second.artifact_decision = Some(decision);
        run(&mut second, &ctx).await;

        assert_eq!(first.artifact.unwrap().artifact_id, second.artifact.unwrap().artifact_id);
    }
}
