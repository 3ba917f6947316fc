//! Reference sub-agent: sentiment analysis across named countries. A
//! private six-node mini-graph — nothing in this module is visible outside
//! it except [`SentimentAnalysisAgent`], so its `SentimentState` and node
//! functions can never collide with another agent's identically-named
//! internals.
//!
//! ```text
//! query_analyzer -> search_executor -> sentiment_scorer -> bias_detector -> synthesizer -> visualizer
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{Artifact, ArtifactType, SubAgentResult, TraceRecord};
use crate::services::llm::{LlmMessage, LlmResponse};
use crate::services::search::SearchResult;
use crate::subagents::{AgentContext, SubAgent};

const DEFAULT_BIAS_TAXONOMY: &[&str] =
    &["selection", "framing", "source", "temporal", "geographic", "confirmation", "language"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    fn from_score(score: f32) -> Self {
        if score < -0.15 {
            SentimentLabel::Negative
        } else if score > 0.15 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Neutral
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Positive => "positive",
        }
    }
}

#[derive(Debug, Clone)]
struct CountrySentiment {
    country: String,
    score: f32,
    sentiment: SentimentLabel,
    reasoning: String,
    positive_pct: f32,
    negative_pct: f32,
    neutral_pct: f32,
    source_type: String,
    credibility: f32,
}

#[derive(Debug, Clone)]
struct CountryBias {
    country: String,
    bias_types: Vec<String>,
    bias_severity: f32,
    overall_bias: String,
    bias_notes: String,
    examples: Vec<String>,
}

#[derive(Default)]
struct SentimentState {
    countries: Vec<String>,
    subject: String,
    search_results: Vec<(String, Vec<SearchResult>)>,
    sentiments: Vec<CountrySentiment>,
    biases: Vec<CountryBias>,
    summary: String,
    key_findings: Vec<String>,
    confidence: f32,
    trace: Vec<TraceRecord>,
    errors: Vec<String>,
}

impl SentimentState {
    fn trace(&mut self, step: &str, status: &str, details: Value) {
        self.trace.push(TraceRecord::new(step, status, details));
    }
}

/// Trimmed mean: drop the highest and lowest `trim_frac` fraction of values
/// (rounded down, at least the single extreme on each side once 3+ values
/// are present) before averaging, to suppress single-article outliers.
fn trimmed_mean(values: &[f32], trim_frac: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    if values.len() < 3 {
        return values.iter().sum::<f32>() / values.len() as f32;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let trim = ((sorted.len() as f32) * trim_frac).floor() as usize;
    let trim = trim.max(1).min((sorted.len() - 1) / 2);
    let trimmed = &sorted[trim..sorted.len() - trim];
    trimmed.iter().sum::<f32>() / trimmed.len() as f32
}

fn extract_countries_deterministic(query: &str) -> Vec<String> {
    // Deterministic path: look for known country names already present in
    // the closed country_codes table before falling back to the LLM.
    let lowered = query.to_lowercase();
    let mut found = Vec::new();
    for name in crate::country_codes::resolve_all(&tokens_as_candidates(&lowered)).mapped {
        if !found.contains(&name.0) {
            found.push(name.0);
        }
    }
    found
}

fn tokens_as_candidates(lowered: &str) -> Vec<String> {
    // Country names may be multi-word ("united states"); check the whole
    // string plus each comma/and-separated clause rather than single tokens.
    let mut candidates: Vec<String> = Vec::new();
    for sep in [",", " and ", " vs ", " vs. "] {
        for part in lowered.split(sep) {
            candidates.push(part.trim().to_string());
        }
    }
    candidates.push(lowered.to_string());
    candidates
}

#[derive(Deserialize)]
struct QueryAnalysis {
    countries: Vec<String>,
    subject: String,
}

async fn query_analyzer(query: &str, ctx: &AgentContext, state: &mut SentimentState) {
    state.trace("query_analyzer", "started", Value::Null);
    let deterministic = extract_countries_deterministic(query);
    if !deterministic.is_empty() {
        state.countries = deterministic;
        state.subject = query.to_string();
        state.trace("query_analyzer", "completed", serde_json::json!({"source": "deterministic", "countries": state.countries}));
        return;
    }

    let messages = vec![
        LlmMessage::system(
            "Extract the countries and the political subject from the user's query. \
             Respond with JSON: {\"countries\": [string], \"subject\": string}.",
        ),
        LlmMessage::user(query.to_string()),
    ];
    match ctx.llm.send_message(&messages).await {
        Ok(LlmResponse { content, .. }) => match serde_json::from_str::<QueryAnalysis>(&content) {
            Ok(parsed) => {
                state.countries = parsed.countries;
                state.subject = parsed.subject;
                state.trace("query_analyzer", "completed", serde_json::json!({"source": "llm"}));
            }
            Err(e) => {
                state.errors.push(format!("query_analyzer: could not parse LLM output: {}", e));
                state.subject = query.to_string();
                state.trace("query_analyzer", "failed", serde_json::json!({"error": e.to_string()}));
            }
        },
        Err(e) => {
            state.errors.push(format!("query_analyzer: LLM call failed: {}", e));
            state.subject = query.to_string();
            state.trace("query_analyzer", "failed", serde_json::json!({"error": e.to_string()}));
        }
    }
}

async fn search_executor(ctx: &AgentContext, state: &mut SentimentState) {
    state.trace("search_executor", "started", serde_json::json!({"countries": state.countries}));
    let searches = state.countries.iter().map(|country| {
        let query = format!("{} {}", country, state.subject);
        let search = ctx.search.clone();
        let cap = ctx.search_max_results;
        let country = country.clone();
        async move {
            let results = search.search(&query, cap).await.unwrap_or_default();
            (country, results)
        }
    });
    state.search_results = join_all(searches).await;
    state.trace(
        "search_executor",
        "completed",
        serde_json::json!({"total_results": state.search_results.iter().map(|(_, r)| r.len()).sum::<usize>()}),
    );
}

#[derive(Deserialize)]
struct ScoreResponse {
    article_scores: Vec<f32>,
    positive_pct: f32,
    negative_pct: f32,
    neutral_pct: f32,
    source_type: String,
    credibility: f32,
    reasoning: String,
}

async fn sentiment_scorer(ctx: &AgentContext, state: &mut SentimentState) {
    state.trace("sentiment_scorer", "started", Value::Null);
    let subject = state.subject.clone();
    let scoring = state.search_results.iter().map(|(country, results)| {
        let llm = ctx.llm.clone();
        let country = country.clone();
        let subject = subject.clone();
        let snippets: Vec<String> = results.iter().map(|r| format!("{}: {}", r.title, r.snippet)).collect();
        async move {
            let prompt = format!(
                "Score the sentiment toward '{}' regarding '{}' in each article below, one float in [-1,1] per article. \
                 Respond with JSON: {{\"article_scores\": [float], \"positive_pct\": float, \"negative_pct\": float, \
                 \"neutral_pct\": float, \"source_type\": string, \"credibility\": float, \"reasoning\": string}}.\n\nArticles:\n{}",
                country,
                subject,
                snippets.join("\n")
            );
            let messages = vec![LlmMessage::system("You are a sentiment scoring assistant."), LlmMessage::user(prompt)];
            let response = llm.send_message(&messages).await;
            (country, response)
        }
    });

    for (country, response) in join_all(scoring).await {
        match response {
            Ok(LlmResponse { content, .. }) => match serde_json::from_str::<ScoreResponse>(&content) {
                Ok(parsed) => {
                    let score = trimmed_mean(&parsed.article_scores, 0.2).clamp(-1.0, 1.0);
                    state.sentiments.push(CountrySentiment {
                        country,
                        score,
                        sentiment: SentimentLabel::from_score(score),
                        reasoning: parsed.reasoning,
                        positive_pct: parsed.positive_pct,
                        negative_pct: parsed.negative_pct,
                        neutral_pct: parsed.neutral_pct,
                        source_type: parsed.source_type,
                        credibility: parsed.credibility.clamp(0.0, 1.0),
                    });
                }
                Err(e) => state.errors.push(format!("sentiment_scorer[{}]: parse error: {}", country, e)),
            },
            Err(e) => state.errors.push(format!("sentiment_scorer[{}]: {}", country, e)),
        }
    }
    state.trace("sentiment_scorer", "completed", serde_json::json!({"scored_countries": state.sentiments.len()}));
}

#[derive(Deserialize)]
struct BiasResponse {
    bias_types: Vec<String>,
    bias_severity: f32,
    overall_bias: String,
    bias_notes: String,
    examples: Vec<String>,
}

async fn bias_detector(ctx: &AgentContext, state: &mut SentimentState) {
    state.trace("bias_detector", "started", Value::Null);
    let subject = state.subject.clone();
    let detection = state.search_results.iter().map(|(country, results)| {
        let llm = ctx.llm.clone();
        let country = country.clone();
        let subject = subject.clone();
        let snippets: Vec<String> = results.iter().map(|r| format!("{}: {}", r.title, r.snippet)).collect();
        async move {
            let prompt = format!(
                "Analyze media bias regarding '{}' coverage of '{}'. Choose bias_types only from {:?}. \
                 Respond with JSON: {{\"bias_types\": [string], \"bias_severity\": float, \"overall_bias\": string, \
                 \"bias_notes\": string, \"examples\": [string]}}.\n\nArticles:\n{}",
                country, subject, DEFAULT_BIAS_TAXONOMY, snippets.join("\n")
            );
            let messages = vec![LlmMessage::system("You are a media bias analyst."), LlmMessage::user(prompt)];
            let response = llm.send_message(&messages).await;
            (country, response)
        }
    });

    for (country, response) in join_all(detection).await {
        match response {
            Ok(LlmResponse { content, .. }) => match serde_json::from_str::<BiasResponse>(&content) {
                Ok(parsed) => {
                    let bias_types: Vec<String> = parsed
                        .bias_types
                        .into_iter()
                        .filter(|t| DEFAULT_BIAS_TAXONOMY.contains(&t.as_str()))
                        .collect();
                    state.biases.push(CountryBias {
                        country,
                        bias_types,
                        bias_severity: parsed.bias_severity.clamp(0.0, 1.0),
                        overall_bias: parsed.overall_bias,
                        bias_notes: parsed.bias_notes,
                        examples: parsed.examples,
                    });
                }
                Err(e) => state.errors.push(format!("bias_detector[{}]: parse error: {}", country, e)),
            },
            Err(e) => state.errors.push(format!("bias_detector[{}]: {}", country, e)),
        }
    }
    state.trace("bias_detector", "completed", serde_json::json!({"analyzed_countries": state.biases.len()}));
}

async fn synthesizer(state: &mut SentimentState) {
    state.trace("synthesizer", "started", Value::Null);
    let mut findings = Vec::new();
    let mut agreement_signals = Vec::new();
    for s in &state.sentiments {
        findings.push(format!("{}: {} ({:+.2})", s.country, s.sentiment.as_str(), s.score));
        agreement_signals.push(s.credibility);
    }
    state.key_findings = findings;
    state.summary = if state.sentiments.is_empty() {
        "No sentiment data could be gathered for the requested countries.".to_string()
    } else {
        format!(
            "Sentiment toward '{}' varies across {} countries: {}.",
            state.subject,
            state.sentiments.len(),
            state.key_findings.join("; ")
        )
    };
    state.confidence = if agreement_signals.is_empty() {
        0.0
    } else {
        (agreement_signals.iter().sum::<f32>() / agreement_signals.len() as f32).clamp(0.0, 1.0)
    };
    state.trace("synthesizer", "completed", serde_json::json!({"confidence": state.confidence}));
}

fn build_table_artifact(state: &SentimentState) -> Artifact {
    let columns = vec!["country", "score", "sentiment", "credibility"];
    let rows: Vec<Vec<Value>> = state
        .sentiments
        .iter()
        .map(|s| {
            vec![
                Value::String(s.country.clone()),
                serde_json::json!(s.score),
                Value::String(s.sentiment.as_str().to_string()),
                serde_json::json!(s.credibility),
            ]
        })
        .collect();
    let data = serde_json::json!({"columns": columns, "rows": rows});
    let id = Artifact::compute_id(ArtifactType::Table, &data);
    Artifact {
        artifact_id: id,
        artifact_type: ArtifactType::Table,
        title: format!("Sentiment data: {}", state.subject),
        format_paths: std::collections::HashMap::new(),
        metadata: data,
        created_at: chrono::Utc::now(),
    }
}

fn build_bar_chart_artifact(state: &SentimentState) -> Artifact {
    let x: Vec<String> = state.sentiments.iter().map(|s| s.country.clone()).collect();
    let y: Vec<f32> = state.sentiments.iter().map(|s| s.score).collect();
    let data = serde_json::json!({"x": x, "y": y, "ylabel": "sentiment score"});
    let id = Artifact::compute_id(ArtifactType::BarChart, &data);
    Artifact {
        artifact_id: id,
        artifact_type: ArtifactType::BarChart,
        title: format!("Sentiment by country: {}", state.subject),
        format_paths: std::collections::HashMap::new(),
        metadata: data,
        created_at: chrono::Utc::now(),
    }
}

fn build_radar_chart_artifact(state: &SentimentState) -> Artifact {
    let axes: Vec<String> = state.sentiments.iter().map(|s| s.country.clone()).collect();
    let series = serde_json::json!([{"name": "sentiment", "values": state.sentiments.iter().map(|s| s.score).collect::<Vec<_>>()}]);
    let data = serde_json::json!({"axes": axes, "series": series});
    let id = Artifact::compute_id(ArtifactType::RadarChart, &data);
    Artifact {
        artifact_id: id,
        artifact_type: ArtifactType::RadarChart,
        title: format!("Sentiment radar: {}", state.subject),
        format_paths: std::collections::HashMap::new(),
        metadata: data,
        created_at: chrono::Utc::now(),
    }
}

fn build_json_only_artifact(state: &SentimentState) -> Artifact {
    let data = serde_json::json!({
        "countries": state.sentiments.iter().map(|s| s.country.clone()).collect::<Vec<_>>(),
        "scores": state.sentiments.iter().map(|s| s.score).collect::<Vec<_>>(),
        "biases": state.biases.iter().map(|b| serde_json::json!({
            "country": b.country, "overall_bias": b.overall_bias, "bias_types": b.bias_types,
        })).collect::<Vec<_>>(),
    });
    let id = Artifact::compute_id(ArtifactType::JsonExport, &data);
    Artifact {
        artifact_id: id,
        artifact_type: ArtifactType::JsonExport,
        title: format!("Sentiment export: {}", state.subject),
        format_paths: std::collections::HashMap::new(),
        metadata: data,
        created_at: chrono::Utc::now(),
    }
}

/// Always emits table + bar chart; additional types only when explicitly
/// named in `requested_visualizations` (no keyword sniffing — map charts in
/// particular are the master's job, not this agent's). Each artifact is
/// rendered and persisted through the injected `ObjectStore` before it is
/// returned, so `format_paths` is never empty on success.
async fn visualizer(state: &SentimentState, requested: &[String], ctx: &AgentContext) -> Vec<Artifact> {
    let mut artifacts = vec![build_table_artifact(state), build_bar_chart_artifact(state)];
    for kind in requested {
        match kind.as_str() {
            "radar_chart" => artifacts.push(build_radar_chart_artifact(state)),
            "json_export" => artifacts.push(build_json_only_artifact(state)),
            _ => {}
        }
    }
    let mut persisted = Vec::with_capacity(artifacts.len());
    for mut artifact in artifacts {
        artifact.format_paths = crate::visualization::render_and_store(
            &artifact.artifact_id,
            &artifact.title,
            artifact.artifact_type,
            &artifact.metadata,
            ctx.object_store.as_ref(),
        )
        .await;
        persisted.push(artifact);
    }
    persisted
}

pub struct SentimentAnalysisAgent;

#[async_trait]
impl SubAgent for SentimentAnalysisAgent {
    async fn call(&self, query: &str, extras: &Value, ctx: &AgentContext) -> SubAgentResult {
        let mut state = SentimentState::default();
        query_analyzer(query, ctx, &mut state).await;
        if state.countries.is_empty() {
            return SubAgentResult::failure("no countries could be identified in the query", state.trace);
        }
        search_executor(ctx, &mut state).await;
        sentiment_scorer(ctx, &mut state).await;
        bias_detector(ctx, &mut state).await;
        synthesizer(&mut state).await;

        let requested: Vec<String> = extras
            .get("requested_visualizations")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let artifacts = visualizer(&state, &requested, ctx).await;
        state.trace("visualizer", "completed", serde_json::json!({"artifact_count": artifacts.len()}));

        let data = serde_json::json!({
            "subject": state.subject,
            "summary": state.summary,
            "key_findings": state.key_findings,
            "sentiment_scores": state.sentiments.iter().map(|s| serde_json::json!({
                "country": s.country,
                "score": s.score,
                "sentiment": s.sentiment.as_str(),
                "reasoning": s.reasoning,
                "positive_pct": s.positive_pct,
                "negative_pct": s.negative_pct,
                "neutral_pct": s.neutral_pct,
                "source_type": s.source_type,
                "credibility": s.credibility,
            })).collect::<Vec<_>>(),
            "bias_analysis": state.biases.iter().map(|b| serde_json::json!({
                "country": b.country,
                "bias_types": b.bias_types,
                "bias_severity": b.bias_severity,
                "overall_bias": b.overall_bias,
                "bias_notes": b.bias_notes,
                "examples": b.examples,
            })).collect::<Vec<_>>(),
        });

        SubAgentResult {
            success: true,
            data,
            artifacts,
            confidence: state.confidence,
            execution_log: state.trace,
            error: if state.errors.is_empty() { None } else { Some(state.errors.join("; ")) },
        }
    }

    fn name(&self) -> &'static str {
        "sentiment_analysis_agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_mean_suppresses_single_outlier() {
        let values = vec![0.1, 0.2, 0.15, 0.9, 0.12];
        let mean = trimmed_mean(&values, 0.2);
        assert!(mean < 0.3, "expected outlier suppressed, got {}", mean);
    }

    #[test]
    fn trimmed_mean_of_small_slice_is_plain_average() {
        let values = vec![0.5, -0.5];
        assert_eq!(trimmed_mean(&values, 0.2), 0.0);
    }

    #[test]
    fn sentiment_label_bands_match_thresholds() {
        assert_eq!(SentimentLabel::from_score(-0.5), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.5), SentimentLabel::Positive);
    }

    #[test]
    fn deterministic_country_extraction_finds_known_names() {
        let countries = extract_countries_deterministic("sentiment on Hamas in US and Israel");
        assert!(countries.iter().any(|c| c.eq_ignore_ascii_case("us")));
        assert!(countries.iter().any(|c| c.eq_ignore_ascii_case("israel")));
    }

    fn test_agent_ctx() -> AgentContext {
        AgentContext {
            llm: Arc::new(crate::services::llm::test_doubles::ScriptedLlmClient::new("{}")),
            search: Arc::new(crate::services::search::test_doubles::FixedSearchClient { results: vec![] }),
            extract: Arc::new(crate::services::extract::test_doubles::FixedExtractClient { pages: vec![] }),
            object_store: Arc::new(crate::services::object_store::test_doubles::InMemoryObjectStore::new()),
            search_max_results: 10,
        }
    }

    #[tokio::test]
    async fn visualizer_always_emits_table_and_bar_chart() {
        let state = SentimentState {
            subject: "test".into(),
            sentiments: vec![CountrySentiment {
                country: "USA".into(),
                score: -0.4,
                sentiment: SentimentLabel::Negative,
                reasoning: "r".into(),
                positive_pct: 10.0,
                negative_pct: 70.0,
                neutral_pct: 20.0,
                source_type: "news".into(),
                credibility: 0.8,
            }],
            ..Default::default()
        };
        let artifacts = visualizer(&state, &[], &test_agent_ctx()).await;
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts.iter().any(|a| a.artifact_type == ArtifactType::Table));
        assert!(artifacts.iter().any(|a| a.artifact_type == ArtifactType::BarChart));
        assert!(artifacts.iter().all(|a| a.format_paths.contains_key("html")));
        let table = artifacts.iter().find(|a| a.artifact_type == ArtifactType::Table).unwrap();
        assert!(table.format_paths.contains_key("xlsx"));
    }

    #[tokio::test]
    async fn visualizer_adds_requested_radar_chart() {
        let state = SentimentState { subject: "test".into(), ..Default::default() };
        let artifacts = visualizer(&state, &["radar_chart".to_string()], &test_agent_ctx()).await;
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts.iter().any(|a| a.artifact_type == ArtifactType::RadarChart));
    }
}
