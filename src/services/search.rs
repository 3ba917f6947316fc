//! Web search client interface. The real adapter wraps Tavily's search
//! endpoint via a pooled `reqwest::Client`; tests use an in-memory double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub score: f32,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a web search, capped at `max_results` hits, ordered by
    /// descending relevance score as reported by the backend.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, BoxError>;
}

/// Real adapter over Tavily's `/search` endpoint. Holds a pooled
/// `reqwest::Client` rather than building one per call.
pub struct TavilySearchClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilySearchClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.tavily.com".to_string(),
        }
    }
}

#[async_trait]
impl SearchClient for TavilySearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, BoxError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
        });
        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await?;
        let payload: serde_json::Value = resp.json().await?;
        let results = payload["results"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                Some(SearchResult {
                    url: item.get("url")?.as_str()?.to_string(),
                    title: item.get("title")?.as_str().unwrap_or_default().to_string(),
                    snippet: item.get("content")?.as_str().unwrap_or_default().to_string(),
                    score: item.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
                })
            })
            .collect();
        Ok(results)
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_doubles {
    use super::*;

    /// Returns a fixed set of results for every call, regardless of query.
    pub struct FixedSearchClient {
        pub results: Vec<SearchResult>,
    }

    #[async_trait]
    impl SearchClient for FixedSearchClient {
        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchResult>, BoxError> {
            Ok(self.results.iter().take(max_results).cloned().collect())
        }
    }
}
