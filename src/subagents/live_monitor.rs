//! Live political monitor: surfaces currently "explosive" topics from a
//! batch of search results. Exposes both the `SubAgent` contract (for the
//! planner's `live_political_monitor_agent` selection) and a free function,
//! [`classify_topics`], reused directly by the `/api/live-monitor/explosive-topics`
//! HTTP handler since that endpoint runs the same scoring logic outside the
//! master graph's iteration loop.

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{SubAgentResult, TraceRecord};
use crate::services::llm::{LlmMessage, LlmResponse};
use crate::subagents::{AgentContext, SubAgent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Critical,
    Explosive,
    Trending,
    Normal,
}

/// Score-band mapping: ≥75 critical, 60-74 explosive, 45-59 trending, <45
/// normal.
pub fn classify_score(score: f32) -> Classification {
    if score >= 75.0 {
        Classification::Critical
    } else if score >= 60.0 {
        Classification::Explosive
    } else if score >= 45.0 {
        Classification::Trending
    } else {
        Classification::Normal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub rank: usize,
    pub topic: String,
    pub explosiveness_score: f32,
    pub classification: Classification,
    pub frequency: usize,
    pub image_url: Option<String>,
    pub entities: Option<Vec<String>>,
    pub reasoning: String,
}

/// Rank raw `(topic, score, frequency, reasoning)` tuples by descending
/// score, assign classifications, and stamp ranks starting at 1.
pub fn classify_topics(mut raw: Vec<(String, f32, usize, String)>) -> Vec<Topic> {
    raw.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    raw.into_iter()
        .enumerate()
        .map(|(idx, (topic, score, frequency, reasoning))| Topic {
            rank: idx + 1,
            topic,
            explosiveness_score: score,
            classification: classify_score(score),
            frequency,
            image_url: None,
            entities: None,
            reasoning,
        })
        .collect()
}

#[derive(Deserialize)]
struct TopicExtraction {
    topic: String,
    explosiveness_score: f32,
    reasoning: String,
}

pub struct LivePoliticalMonitorAgent;

#[async_trait]
impl SubAgent for LivePoliticalMonitorAgent {
    async fn call(&self, query: &str, extras: &Value, ctx: &AgentContext) -> SubAgentResult {
        let mut trace = vec![TraceRecord::new("live_monitor_search", "started", Value::Null)];
        let keywords: Vec<String> = extras
            .get("keywords")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_else(|| vec![query.to_string()]);
        let max_results = extras
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(ctx.search_max_results);

        let searches = keywords.iter().map(|keyword| {
            let search = ctx.search.clone();
            let keyword = keyword.clone();
            async move {
                let results = search.search(&keyword, max_results).await.unwrap_or_default();
                (keyword, results)
            }
        });
        let coverage = join_all(searches).await;
        trace.push(TraceRecord::new(
            "live_monitor_search",
            "completed",
            serde_json::json!({"total_articles": coverage.iter().map(|(_, r)| r.len()).sum::<usize>()}),
        ));

        trace.push(TraceRecord::new("explosiveness_scoring", "started", Value::Null));
        let mut errors = Vec::new();
        let scoring = coverage.iter().map(|(keyword, results)| {
            let llm = ctx.llm.clone();
            let keyword = keyword.clone();
            let frequency = results.len();
            let snippets: Vec<String> = results.iter().map(|r| format!("{}: {}", r.title, r.snippet)).collect();
            async move {
                let prompt = format!(
                    "Rate how explosive/breaking the topic '{}' is right now on a 0-100 scale given this coverage. \
                     Respond with JSON: {{\"topic\": string, \"explosiveness_score\": float, \"reasoning\": string}}.\n\nArticles:\n{}",
                    keyword,
                    snippets.join("\n")
                );
                let messages = vec![LlmMessage::system("You are a breaking-news explosiveness rater."), LlmMessage::user(prompt)];
                (keyword, frequency, llm.send_message(&messages).await)
            }
        });

        let mut raw = Vec::new();
        for (keyword, frequency, response) in join_all(scoring).await {
            match response {
                Ok(LlmResponse { content, .. }) => match serde_json::from_str::<TopicExtraction>(&content) {
                    Ok(parsed) => raw.push((parsed.topic, parsed.explosiveness_score.clamp(0.0, 100.0), frequency, parsed.reasoning)),
                    Err(e) => errors.push(format!("explosiveness_scoring[{}]: parse error: {}", keyword, e)),
                },
                Err(e) => errors.push(format!("explosiveness_scoring[{}]: {}", keyword, e)),
            }
        }
        let topics = classify_topics(raw);
        trace.push(TraceRecord::new("explosiveness_scoring", "completed", serde_json::json!({"topic_count": topics.len()})));

        let confidence = if topics.is_empty() { 0.0 } else { 0.6 };
        SubAgentResult {
            success: !topics.is_empty(),
            data: serde_json::json!({"topics": topics}),
            artifacts: Vec::new(),
            confidence,
            execution_log: trace,
            error: if errors.is_empty() { None } else { Some(errors.join("; ")) },
        }
    }

    fn name(&self) -> &'static str {
        "live_political_monitor_agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_score_matches_documented_bands() {
        assert_eq!(classify_score(82.0), Classification::Critical);
        assert_eq!(classify_score(68.0), Classification::Explosive);
        assert_eq!(classify_score(50.0), Classification::Trending);
        assert_eq!(classify_score(30.0), Classification::Normal);
    }

    #[test]
    fn classify_score_boundaries_are_inclusive_on_the_low_edge() {
        assert_eq!(classify_score(75.0), Classification::Critical);
        assert_eq!(classify_score(60.0), Classification::Explosive);
        assert_eq!(classify_score(45.0), Classification::Trending);
        assert_eq!(classify_score(44.999), Classification::Normal);
    }

    #[test]
    fn classify_topics_ranks_descending_by_score() {
        let raw = vec![
            ("a".to_string(), 82.0, 5, "r".to_string()),
            ("b".to_string(), 68.0, 3, "r".to_string()),
            ("c".to_string(), 50.0, 2, "r".to_string()),
            ("d".to_string(), 30.0, 1, "r".to_string()),
        ];
        let topics = classify_topics(raw);
        let classifications: Vec<Classification> = topics.iter().map(|t| t.classification).collect();
        assert_eq!(
            classifications,
            vec![Classification::Critical, Classification::Explosive, Classification::Trending, Classification::Normal]
        );
        assert_eq!(topics[0].rank, 1);
        assert_eq!(topics[3].rank, 4);
    }
}
