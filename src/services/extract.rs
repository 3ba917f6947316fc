//! Page-extraction client interface: given URLs from a search result,
//! fetch and return cleaned article text. Kept as a second narrow trait
//! alongside `SearchClient` rather than one fat "web" trait, so a test
//! double can fail extraction without touching search.

use async_trait::async_trait;

use crate::error::BoxError;

#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub url: String,
    pub content: String,
    pub success: bool,
}

#[async_trait]
pub trait ExtractClient: Send + Sync {
    /// Extract cleaned text from each URL. Per-URL failures are reported in
    /// the returned `ExtractedPage::success` flag rather than failing the
    /// whole batch — one dead link should not blank out the others.
    async fn extract(&self, urls: &[String]) -> Result<Vec<ExtractedPage>, BoxError>;
}

pub struct TavilyExtractClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilyExtractClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.tavily.com".to_string(),
        }
    }
}

#[async_trait]
impl ExtractClient for TavilyExtractClient {
    async fn extract(&self, urls: &[String]) -> Result<Vec<ExtractedPage>, BoxError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "urls": urls,
        });
        let resp = self
            .client
            .post(format!("{}/extract", self.base_url))
            .json(&body)
            .send()
            .await?;
        let payload: serde_json::Value = resp.json().await?;
        let mut pages: Vec<ExtractedPage> = payload["results"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                Some(ExtractedPage {
                    url: item.get("url")?.as_str()?.to_string(),
                    content: item.get("raw_content")?.as_str().unwrap_or_default().to_string(),
                    success: true,
                })
            })
            .collect();
        for failed in payload["failed_results"].as_array().cloned().unwrap_or_default() {
            if let Some(url) = failed.get("url").and_then(|v| v.as_str()) {
                pages.push(ExtractedPage { url: url.to_string(), content: String::new(), success: false });
            }
        }
        Ok(pages)
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_doubles {
    use super::*;

    pub struct FixedExtractClient {
        pub pages: Vec<ExtractedPage>,
    }

    #[async_trait]
    impl ExtractClient for FixedExtractClient {
        async fn extract(&self, urls: &[String]) -> Result<Vec<ExtractedPage>, BoxError> {
            Ok(urls
                .iter()
                .map(|url| {
                    self.pages
                        .iter()
                        .find(|p| &p.url == url)
                        .cloned()
                        .unwrap_or_else(|| ExtractedPage { url: url.clone(), content: String::new(), success: false })
                })
                .collect())
        }
    }
}
