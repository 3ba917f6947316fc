//! Visualization pipeline backing the Artifact Creator node: type-specific
//! data extraction from sub-agent results, then export to HTML (always),
//! XLSX (tables), and a JSON sidecar. Plain structs plus free functions,
//! no renderer trait — there's only ever one backend per format.

pub mod export;
pub mod extract;

use std::collections::HashMap;

use crate::model::ArtifactType;
use crate::services::ObjectStore;

pub use extract::{extract_chart_data, ChartData};

/// Render every export format for one artifact's data and persist each
/// through the given `ObjectStore`, returning the resulting `format_paths`
/// map. Shared by the master graph's artifact creator and by sub-agents
/// that build their own artifacts, so neither path can ship an `Artifact`
/// with empty `format_paths`. Each format is best-effort: a failure to
/// render or persist one format is dropped from the map rather than
/// failing the whole artifact.
pub async fn render_and_store(
    artifact_id: &str,
    title: &str,
    chart_type: ArtifactType,
    data: &serde_json::Value,
    object_store: &dyn ObjectStore,
) -> HashMap<String, String> {
    let mut format_paths = HashMap::new();

    if let Ok(bytes) = export::render_html(title, chart_type, data) {
        if let Ok(uri) = object_store.put(&format!("artifacts/{}/chart.html", artifact_id), &bytes).await {
            format_paths.insert("html".to_string(), uri);
        }
    }

    let json_bytes = export::render_json(title, chart_type, data);
    if let Ok(uri) = object_store.put(&format!("artifacts/{}/data.json", artifact_id), &json_bytes).await {
        format_paths.insert("json".to_string(), uri);
    }

    if chart_type == ArtifactType::Table {
        if let Ok(bytes) = export::render_xlsx(data) {
            if let Ok(uri) = object_store.put(&format!("artifacts/{}/table.xlsx", artifact_id), &bytes).await {
                format_paths.insert("xlsx".to_string(), uri);
            }
        }
    }

    format_paths
}
