//! Media bias comparison agent: given named outlets and a subject, searches
//! each outlet's coverage and asks the LLM to compare framing. Shares no
//! code with [`super::sentiment`] beyond the injected `AgentContext` — its
//! own state type is private to this module.

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{Artifact, ArtifactType, SubAgentResult, TraceRecord};
use crate::services::llm::{LlmMessage, LlmResponse};
use crate::subagents::{AgentContext, SubAgent};

#[derive(Debug, Clone)]
struct OutletFraming {
    outlet: String,
    framing_summary: String,
    bias_indicators: Vec<String>,
    tone_score: f32,
}

#[derive(Deserialize)]
struct FramingResponse {
    framing_summary: String,
    bias_indicators: Vec<String>,
    tone_score: f32,
}

fn extract_outlets(query: &str, extras: &Value) -> Vec<String> {
    if let Some(arr) = extras.get("outlets").and_then(|v| v.as_array()) {
        let outlets: Vec<String> = arr.iter().filter_map(|v| v.as_str().map(String::from)).collect();
        if !outlets.is_empty() {
            return outlets;
        }
    }
    // Fall back to splitting on "vs"/"and" style comparisons in the query text.
    query
        .split([',', ';'])
        .flat_map(|s| s.split(" vs ").chain(s.split(" and ")))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub struct MediaBiasDetectorAgent;

#[async_trait]
impl SubAgent for MediaBiasDetectorAgent {
    async fn call(&self, query: &str, extras: &Value, ctx: &AgentContext) -> SubAgentResult {
        let mut trace = Vec::new();
        trace.push(TraceRecord::new("outlet_extractor", "started", Value::Null));
        let outlets = extract_outlets(query, extras);
        if outlets.is_empty() {
            trace.push(TraceRecord::new("outlet_extractor", "failed", Value::Null));
            return SubAgentResult::failure("no outlets named for bias comparison", trace);
        }
        trace.push(TraceRecord::new("outlet_extractor", "completed", serde_json::json!({"outlets": outlets})));

        trace.push(TraceRecord::new("coverage_search", "started", Value::Null));
        let subject = query.to_string();
        let searches = outlets.iter().map(|outlet| {
            let search = ctx.search.clone();
            let outlet = outlet.clone();
            let subject = subject.clone();
            let cap = ctx.search_max_results;
            async move {
                let q = format!("{} {}", outlet, subject);
                let results = search.search(&q, cap).await.unwrap_or_default();
                (outlet, results)
            }
        });
        let coverage = join_all(searches).await;
        trace.push(TraceRecord::new("coverage_search", "completed", Value::Null));

        trace.push(TraceRecord::new("framing_analysis", "started", Value::Null));
        let mut errors = Vec::new();
        let analyses = coverage.iter().map(|(outlet, results)| {
            let llm = ctx.llm.clone();
            let outlet = outlet.clone();
            let snippets: Vec<String> = results.iter().map(|r| format!("{}: {}", r.title, r.snippet)).collect();
            async move {
                let prompt = format!(
                    "Summarize how '{}' frames this coverage. Respond with JSON: \
                     {{\"framing_summary\": string, \"bias_indicators\": [string], \"tone_score\": float}} \
                     where tone_score is in [-1,1] (negative = critical, positive = favorable).\n\nArticles:\n{}",
                    outlet,
                    snippets.join("\n")
                );
                let messages = vec![LlmMessage::system("You are a media framing analyst."), LlmMessage::user(prompt)];
                (outlet, llm.send_message(&messages).await)
            }
        });

        let mut framings = Vec::new();
        for (outlet, response) in join_all(analyses).await {
            match response {
                Ok(LlmResponse { content, .. }) => match serde_json::from_str::<FramingResponse>(&content) {
                    Ok(parsed) => framings.push(OutletFraming {
                        outlet,
                        framing_summary: parsed.framing_summary,
                        bias_indicators: parsed.bias_indicators,
                        tone_score: parsed.tone_score.clamp(-1.0, 1.0),
                    }),
                    Err(e) => errors.push(format!("framing_analysis[{}]: parse error: {}", outlet, e)),
                },
                Err(e) => errors.push(format!("framing_analysis[{}]: {}", outlet, e)),
            }
        }
        trace.push(TraceRecord::new("framing_analysis", "completed", serde_json::json!({"analyzed": framings.len()})));

        let columns = vec!["outlet", "tone_score", "framing_summary"];
        let rows: Vec<Vec<Value>> = framings
            .iter()
            .map(|f| vec![Value::String(f.outlet.clone()), serde_json::json!(f.tone_score), Value::String(f.framing_summary.clone())])
            .collect();
        let table_data = serde_json::json!({"columns": columns, "rows": rows});
        let artifact_id = Artifact::compute_id(ArtifactType::Table, &table_data);
        let title = format!("Outlet framing comparison: {}", query);
        let format_paths = crate::visualization::render_and_store(&artifact_id, &title, ArtifactType::Table, &table_data, ctx.object_store.as_ref()).await;
        let artifact = Artifact {
            artifact_id,
            artifact_type: ArtifactType::Table,
            title,
            format_paths,
            metadata: table_data,
            created_at: chrono::Utc::now(),
        };

        // More outlets successfully analyzed relative to requested = higher confidence.
        let confidence = if outlets.is_empty() {
            0.0
        } else {
            (framings.len() as f32 / outlets.len() as f32).clamp(0.0, 1.0)
        };

        let data = serde_json::json!({
            "outlets": framings.iter().map(|f| serde_json::json!({
                "outlet": f.outlet,
                "framing_summary": f.framing_summary,
                "bias_indicators": f.bias_indicators,
                "tone_score": f.tone_score,
            })).collect::<Vec<_>>(),
        });

        SubAgentResult {
            success: !framings.is_empty(),
            data,
            artifacts: vec![artifact],
            confidence: confidence.clamp(0.0, 1.0),
            execution_log: trace,
            error: if errors.is_empty() { None } else { Some(errors.join("; ")) },
        }
    }

    fn name(&self) -> &'static str {
        "media_bias_detector_agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_outlets_prefers_explicit_extras() {
        let extras = serde_json::json!({"outlets": ["BBC", "Fox News"]});
        let outlets = extract_outlets("ignored text", &extras);
        assert_eq!(outlets, vec!["BBC".to_string(), "Fox News".to_string()]);
    }

    #[test]
    fn extract_outlets_falls_back_to_query_splitting() {
        let outlets = extract_outlets("BBC vs Fox News coverage of the election", &Value::Null);
        assert!(outlets.len() >= 2);
    }
}
