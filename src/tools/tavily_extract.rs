//! Extraction tool: wraps an `ExtractClient`. Kept as a separate tool from
//! `tavily_search` rather than folded into it, so the planner can request
//! extraction only when it already has URLs in hand (e.g. from a prior
//! search round) instead of always paying for a fetch.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BoxError;
use crate::services::ExtractClient;
use crate::tools::{Tool, ToolMetadata, ToolResult};

pub struct TavilyExtractTool {
    client: Arc<dyn ExtractClient>,
}

impl TavilyExtractTool {
    pub fn new(client: Arc<dyn ExtractClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for TavilyExtractTool {
    async fn execute(&self, input: Value) -> Result<ToolResult, BoxError> {
        let urls: Vec<String> = match input.get("urls").and_then(|v| v.as_array()) {
            Some(arr) => arr.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
            None => return Ok(ToolResult::failure("missing 'urls' array field")),
        };
        if urls.is_empty() {
            return Ok(ToolResult::failure("'urls' array must not be empty"));
        }
        match self.client.extract(&urls).await {
            Ok(pages) => Ok(ToolResult::success(serde_json::to_value(pages)?)
                .with_metadata("tool", "tavily_extract")),
            Err(e) => Ok(ToolResult::failure(e.to_string())),
        }
    }

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(
            "tavily_extract",
            "Fetches and cleans full article text for a batch of URLs, tolerating per-URL failures.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::extract::test_doubles::FixedExtractClient;
    use crate::services::ExtractedPage;

    #[tokio::test]
    async fn execute_returns_failure_for_empty_urls() {
        let client = Arc::new(FixedExtractClient { pages: vec![] });
        let tool = TavilyExtractTool::new(client);
        let result = tool.execute(serde_json::json!({"urls": []})).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn execute_tolerates_partial_failures() {
        let client = Arc::new(FixedExtractClient {
            pages: vec![ExtractedPage { url: "https://ok.com".into(), content: "body".into(), success: true }],
        });
        let tool = TavilyExtractTool::new(client);
        let result = tool
            .execute(serde_json::json!({"urls": ["https://ok.com", "https://dead.com"]}))
            .await
            .unwrap();
        assert!(result.success);
        let pages = result.output.as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1]["success"], false);
    }
}
