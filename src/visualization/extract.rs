//! Type-specific extractors that turn `AgentState::sub_agent_results` into
//! chart data when `ArtifactDecision::data` is absent.

use serde_json::Value;

use crate::country_codes;
use crate::model::{ArtifactType, SubAgentResult};

/// Resolved chart payload plus whatever country names the map extractor
/// could not place in the closed ISO-3 table.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub data: Value,
    pub skipped_countries: Vec<String>,
}

impl ChartData {
    fn without_skips(data: Value) -> Self {
        Self { data, skipped_countries: Vec::new() }
    }
}

/// Resolve chart data either from an explicit decision payload or, when
/// absent, by extracting it from the sub-agent results already on hand.
pub fn extract_chart_data(
    chart_type: ArtifactType,
    explicit: Option<&Value>,
    sub_agent_results: &std::collections::HashMap<String, SubAgentResult>,
) -> ChartData {
    if let Some(data) = explicit {
        return extract_with_fallback(chart_type, data.clone(), sub_agent_results);
    }
    extract_from_sub_agents(chart_type, sub_agent_results)
}

/// An explicit `map_chart` payload still needs country normalization; every
/// other chart type's explicit data passes through unchanged.
fn extract_with_fallback(
    chart_type: ArtifactType,
    data: Value,
    _sub_agent_results: &std::collections::HashMap<String, SubAgentResult>,
) -> ChartData {
    match chart_type {
        ArtifactType::MapChart => normalize_map_payload(data),
        _ => ChartData::without_skips(data),
    }
}

fn sentiment_entries(sub_agent_results: &std::collections::HashMap<String, SubAgentResult>) -> Vec<Value> {
    sub_agent_results
        .get("sentiment_analysis_agent")
        .filter(|r| r.success)
        .and_then(|r| r.data.get("sentiment_scores"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

fn extract_from_sub_agents(
    chart_type: ArtifactType,
    sub_agent_results: &std::collections::HashMap<String, SubAgentResult>,
) -> ChartData {
    let entries = sentiment_entries(sub_agent_results);
    match chart_type {
        ArtifactType::MapChart => {
            let countries: Vec<String> = entries
                .iter()
                .filter_map(|e| e.get("country").and_then(|c| c.as_str()).map(String::from))
                .collect();
            let values: Vec<f64> = entries.iter().map(|e| e.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0)).collect();
            normalize_map_payload(serde_json::json!({
                "countries": countries,
                "values": values,
                "legend_title": "sentiment score",
            }))
        }
        ArtifactType::BarChart | ArtifactType::LineChart => {
            let x: Vec<String> = entries
                .iter()
                .filter_map(|e| e.get("country").and_then(|c| c.as_str()).map(String::from))
                .collect();
            let y: Vec<f64> = entries.iter().map(|e| e.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0)).collect();
            ChartData::without_skips(serde_json::json!({"x": x, "y": y, "ylabel": "sentiment score"}))
        }
        ArtifactType::RadarChart => {
            let axes: Vec<String> = entries
                .iter()
                .filter_map(|e| e.get("country").and_then(|c| c.as_str()).map(String::from))
                .collect();
            let values: Vec<f64> = entries.iter().map(|e| e.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0)).collect();
            ChartData::without_skips(serde_json::json!({"axes": axes, "series": [{"name": "sentiment", "values": values}]}))
        }
        ArtifactType::Table => {
            let columns = vec!["country", "score", "sentiment", "credibility"];
            let rows: Vec<Value> = entries
                .iter()
                .map(|e| {
                    serde_json::json!([
                        e.get("country").cloned().unwrap_or(Value::Null),
                        e.get("score").cloned().unwrap_or(Value::Null),
                        e.get("sentiment").cloned().unwrap_or(Value::Null),
                        e.get("credibility").cloned().unwrap_or(Value::Null),
                    ])
                })
                .collect();
            ChartData::without_skips(serde_json::json!({"columns": columns, "rows": rows}))
        }
        ArtifactType::MindMap => {
            let children: Vec<Value> = entries
                .iter()
                .filter_map(|e| e.get("country").and_then(|c| c.as_str()).map(|c| serde_json::json!({"name": c, "children": []})))
                .collect();
            ChartData::without_skips(serde_json::json!({"root": "sentiment findings", "children": children}))
        }
        ArtifactType::JsonExport => ChartData::without_skips(serde_json::json!({"sub_agent_results": sub_agent_results.iter().map(|(k, v)| (k.clone(), v.data.clone())).collect::<std::collections::HashMap<_, _>>()})),
    }
}

/// Normalize `{countries, values, labels?, legend_title?}` country entries
/// through the closed ISO-3 table, recording unmapped names rather than
/// dropping them silently.
fn normalize_map_payload(mut data: Value) -> ChartData {
    let raw_countries: Vec<String> = data
        .get("countries")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    let outcome = country_codes::resolve_all(&raw_countries);

    let values: Vec<Value> = data.get("values").and_then(|v| v.as_array()).cloned().unwrap_or_default();
    let mapped_indices: Vec<usize> = raw_countries
        .iter()
        .enumerate()
        .filter(|(_, name)| outcome.mapped.iter().any(|(n, _)| n == *name))
        .map(|(i, _)| i)
        .collect();

    let codes: Vec<String> = mapped_indices.iter().map(|&i| outcome.mapped.iter().find(|(n, _)| n == &raw_countries[i]).unwrap().1.clone()).collect();
    let filtered_values: Vec<Value> = mapped_indices.iter().map(|&i| values.get(i).cloned().unwrap_or(Value::Null)).collect();

    if let Some(obj) = data.as_object_mut() {
        obj.insert("countries".into(), serde_json::json!(codes));
        obj.insert("values".into(), serde_json::json!(filtered_values));
    }

    ChartData { data, skipped_countries: outcome.skipped }
}
