//! Core data model shared across the master graph and sub-agent framework:
//! sessions, queries, the threaded `AgentState`, the uniform
//! `SubAgentResult` contract, artifacts, trace records, and citations.
//! Plain structs, builder methods for optional fields, `Arc<str>` only
//! where cheap cloning matters.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default iteration cap before the decision gate forces synthesis.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// Floor (in milliseconds) applied to any node duration reported by the
/// execution log, so fast LLM calls whose wall clock straddles two
/// millisecond ticks never show up as a zero-second step downstream.
pub const MIN_NODE_DURATION_MS: i64 = 50;

/// One turn in a session's message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One WebSocket conversation. Lives in memory for the lifetime of the
/// connection; its execution logs are persisted per query via the injected
/// `RecordStore` (see `services::record_store`).
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_history: Vec<Turn>,
    pub execution_log: Vec<TraceRecord>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: Utc::now(),
            message_history: Vec::new(),
            execution_log: Vec::new(),
        }
    }

    /// Append a trace record. Execution logs are append-only: there is no
    /// method to mutate or remove a prior entry.
    pub fn record_trace(&mut self, record: TraceRecord) {
        self.execution_log.push(record);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Processing,
    Completed,
    Failed,
}

/// Per-node wall-clock accounting for one query, keyed by node name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timings {
    pub per_node_ms: HashMap<String, i64>,
    pub total_ms: i64,
}

/// One user turn end to end: the text, its fingerprint, status, and the
/// summary metrics surfaced by `GET /api/analyze`.
#[derive(Debug, Clone)]
pub struct Query {
    pub query_text: String,
    pub user_session: String,
    pub fingerprint: String,
    pub status: QueryStatus,
    pub timings: Timings,
    pub tools_used: Vec<String>,
    pub confidence: f32,
}

impl Query {
    pub fn new(query_text: impl Into<String>, user_session: impl Into<String>) -> Self {
        let query_text = query_text.into();
        let fingerprint = crate::fingerprint::fingerprint(&query_text, None);
        Self {
            query_text,
            user_session: user_session.into(),
            fingerprint,
            status: QueryStatus::Processing,
            timings: Timings::default(),
            tools_used: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// `{step, timestamp, status, details}` — two or more per node enable
/// duration derivation by the caller (see `master::trace`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub step: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub details: serde_json::Value,
}

impl TraceRecord {
    pub fn new(step: impl Into<String>, status: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            step: step.into(),
            timestamp: Utc::now(),
            status: status.into(),
            details,
        }
    }
}

/// A deduplicated (by URL) source backing a claim in the synthesized answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub score: f32,
    pub domain: String,
}

impl Citation {
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>, score: f32) -> Self {
        let url = url.into();
        let domain = extract_domain(&url);
        Self {
            url,
            title: title.into(),
            snippet: snippet.into(),
            score: score.clamp(0.0, 1.0),
            domain,
        }
    }
}

fn extract_domain(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

/// Deduplicate citations by URL, keeping the first (highest-priority) copy
/// seen and preserving relative order.
pub fn dedupe_citations(citations: Vec<Citation>) -> Vec<Citation> {
    let mut seen = std::collections::HashSet::new();
    citations
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}

/// One visualization type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    BarChart,
    LineChart,
    MapChart,
    RadarChart,
    Table,
    MindMap,
    JsonExport,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::BarChart => "bar_chart",
            ArtifactType::LineChart => "line_chart",
            ArtifactType::MapChart => "map_chart",
            ArtifactType::RadarChart => "radar_chart",
            ArtifactType::Table => "table",
            ArtifactType::MindMap => "mind_map",
            ArtifactType::JsonExport => "json_export",
        }
    }
}

/// Deterministic export of a visualization. `artifact_id` is a pure function
/// of `(type, normalized data)`, so regenerating with identical inputs is
/// idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: String,
    pub artifact_type: ArtifactType,
    pub title: String,
    /// format -> storage URI. At minimum carries "html".
    pub format_paths: HashMap<String, String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Compute the 12-hex content-addressed ID: `sha256(type || normalized_data)[..12]`.
    pub fn compute_id(artifact_type: ArtifactType, normalized_data: &serde_json::Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(artifact_type.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(normalized_data.to_string().as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{:02x}", b)).collect::<String>()[..12].to_string()
    }
}

/// Uniform shape every sub-agent must return, never raising to the master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgentResult {
    pub success: bool,
    pub data: serde_json::Value,
    pub artifacts: Vec<Artifact>,
    pub confidence: f32,
    pub execution_log: Vec<TraceRecord>,
    pub error: Option<String>,
}

impl SubAgentResult {
    pub fn failure(error: impl Into<String>, execution_log: Vec<TraceRecord>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            artifacts: Vec::new(),
            confidence: 0.0,
            execution_log,
            error: Some(error.into()),
        }
    }
}

/// Strategic planner output — the only place an LLM's JSON steers control
/// flow. `tools_to_use` is validated against the closed tool registry
/// before it ever reaches the tool executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub can_answer_directly: bool,
    pub tools_to_use: Vec<String>,
    pub reasoning: String,
    pub expected_entities: Vec<String>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            can_answer_directly: false,
            tools_to_use: Vec::new(),
            reasoning: String::new(),
            expected_entities: Vec::new(),
        }
    }
}

/// Chart-type-specific payload the Artifact Decision node may emit, or leave
/// absent when prior sub-agent data already supplies the fields (the
/// Artifact Creator then runs a type-specific extractor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDecision {
    pub should_create: bool,
    pub chart_type: ArtifactType,
    pub title: String,
    pub data: Option<serde_json::Value>,
}

impl Default for ArtifactDecision {
    fn default() -> Self {
        Self {
            should_create: false,
            chart_type: ArtifactType::Table,
            title: String::new(),
            data: None,
        }
    }
}

/// The object threaded through every master graph node. Copy-on-write at
/// node boundaries: nodes receive `AgentState`, mutate their own slice of it,
/// and return it — no node ever rewrites a prior node's entries in
/// `execution_log` or `message_history`.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub user_query: String,
    pub message_history: Vec<Turn>,
    pub iteration: usize,
    pub max_iterations: usize,
    pub plan: Plan,
    pub tool_results: HashMap<String, serde_json::Value>,
    pub sub_agent_results: HashMap<String, SubAgentResult>,
    pub citations: Vec<Citation>,
    pub final_response: String,
    pub artifact_decision: Option<ArtifactDecision>,
    pub artifact: Option<Artifact>,
    pub execution_log: Vec<TraceRecord>,
    pub error_log: Vec<String>,
}

impl AgentState {
    pub fn new(user_query: impl Into<String>, max_iterations: usize) -> Self {
        Self {
            user_query: user_query.into(),
            message_history: Vec::new(),
            iteration: 0,
            max_iterations,
            plan: Plan::default(),
            tool_results: HashMap::new(),
            sub_agent_results: HashMap::new(),
            citations: Vec::new(),
            final_response: String::new(),
            artifact_decision: None,
            artifact: None,
            execution_log: Vec::new(),
            error_log: Vec::new(),
        }
    }

    /// Append-only: every node may push a trace record but never touch a
    /// prior one.
    pub fn trace(&mut self, record: TraceRecord) {
        self.execution_log.push(record);
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("agent state error: {}", message);
        self.error_log.push(message);
    }

    /// Invariant: `tool_results` keys and `sub_agent_results` keys never
    /// overlap. Debug-asserted at the boundary where both maps are
    /// populated (tool executor).
    pub fn assert_key_disjoint_invariant(&self) {
        debug_assert!(
            self.tool_results
                .keys()
                .all(|k| !self.sub_agent_results.contains_key(k)),
            "tool_results and sub_agent_results keys must be disjoint"
        );
    }
}

/// Cheaply-cloned reference to response text.
pub type SharedText = Arc<str>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_dedupe_keeps_first_occurrence() {
        let a = Citation::new("https://a.com/x", "A", "snippet a", 0.9);
        let b = Citation::new("https://a.com/x", "A dup", "snippet b", 0.5);
        let c = Citation::new("https://b.com/y", "B", "snippet c", 0.4);
        let deduped = dedupe_citations(vec![a, b, c]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "A");
        assert_eq!(deduped[1].url, "https://b.com/y");
    }

    #[test]
    fn citation_extracts_domain() {
        let c = Citation::new("https://example.com/path?q=1", "T", "s", 0.5);
        assert_eq!(c.domain, "example.com");
    }

    #[test]
    fn artifact_id_is_pure_function_of_type_and_data() {
        let data = serde_json::json!({"countries": ["USA"], "values": [1.0]});
        let id1 = Artifact::compute_id(ArtifactType::MapChart, &data);
        let id2 = Artifact::compute_id(ArtifactType::MapChart, &data);
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 12);

        let other_type = Artifact::compute_id(ArtifactType::BarChart, &data);
        assert_ne!(id1, other_type);
    }

    #[test]
    fn agent_state_key_disjointness_holds_by_construction() {
        let mut state = AgentState::new("q", DEFAULT_MAX_ITERATIONS);
        state.tool_results.insert("tavily_search".into(), serde_json::Value::Null);
        state.sub_agent_results.insert(
            "sentiment_analysis_agent".into(),
            SubAgentResult::failure("boom", vec![]),
        );
        state.assert_key_disjoint_invariant();
    }
}
