//! Search tool: wraps a `SearchClient` behind the closed `Tool` registry
//! contract so the planner sees it alongside every other tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BoxError;
use crate::services::SearchClient;
use crate::tools::{Tool, ToolMetadata, ToolResult};

pub struct TavilySearchTool {
    client: Arc<dyn SearchClient>,
    max_results: usize,
}

impl TavilySearchTool {
    pub fn new(client: Arc<dyn SearchClient>, max_results: usize) -> Self {
        Self { client, max_results }
    }
}

#[async_trait]
impl Tool for TavilySearchTool {
    async fn execute(&self, input: Value) -> Result<ToolResult, BoxError> {
        let query = match input.get("query").and_then(|v| v.as_str()) {
            Some(q) if !q.trim().is_empty() => q,
            _ => return Ok(ToolResult::failure("missing or empty 'query' field")),
        };
        match self.client.search(query, self.max_results).await {
            Ok(results) => Ok(ToolResult::success(serde_json::to_value(results)?)
                .with_metadata("tool", "tavily_search")),
            Err(e) => Ok(ToolResult::failure(e.to_string())),
        }
    }

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(
            "tavily_search",
            "Searches the web for recent sources relevant to a query and returns ranked results.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::search::test_doubles::FixedSearchClient;
    use crate::services::SearchResult;

    #[tokio::test]
    async fn execute_forwards_results_from_the_client() {
        let client = Arc::new(FixedSearchClient {
            results: vec![SearchResult { url: "https://a.com".into(), title: "A".into(), snippet: "s".into(), score: 0.9 }],
        });
        let tool = TavilySearchTool::new(client, 5);
        let result = tool.execute(serde_json::json!({"query": "nato expansion"})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn execute_rejects_missing_query() {
        let client = Arc::new(FixedSearchClient { results: vec![] });
        let tool = TavilySearchTool::new(client, 5);
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(!result.success);
    }
}
