//! Tool protocol and the closed registry of tools the strategic planner may
//! select from: a `ToolResult` with `success`/`failure` constructors, a
//! `ToolMetadata` describing each tool for the planner's prompt, and a
//! `Tool` async-trait with `initialize`/`shutdown` default no-ops.

pub mod tavily_extract;
pub mod tavily_search;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BoxError;

/// Uniform tool outcome shared by every tool implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: Value,
    pub error: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl ToolResult {
    pub fn success(output: Value) -> Self {
        Self { success: true, output, error: None, metadata: HashMap::new() }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, output: Value::Null, error: Some(error.into()), metadata: HashMap::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Static description surfaced to the planner so it can decide which tools
/// to request without inspecting implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

/// One entry in the closed tool registry. The planner may only request
/// tools that exist in this registry; plan validation rejects unknown
/// tool names rather than attempting to invoke them.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn execute(&self, input: Value) -> Result<ToolResult, BoxError>;
    fn metadata(&self) -> ToolMetadata;

    async fn initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Closed set of tools available to the strategic planner, keyed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.metadata().name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list_metadata(&self) -> Vec<ToolMetadata> {
        self.tools.values().map(|t| t.metadata()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        async fn execute(&self, input: Value) -> Result<ToolResult, BoxError> {
            Ok(ToolResult::success(input))
        }

        fn metadata(&self) -> ToolMetadata {
            ToolMetadata::new("echo", "returns its input unchanged")
        }
    }

    #[tokio::test]
    async fn registry_round_trips_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.contains("echo"));
        assert!(!registry.contains("nonexistent"));

        let tool = registry.get("echo").unwrap();
        let result = tool.execute(serde_json::json!({"x": 1})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, serde_json::json!({"x": 1}));
    }

    #[test]
    fn tool_result_failure_carries_no_output() {
        let result = ToolResult::failure("network error");
        assert!(!result.success);
        assert_eq!(result.output, Value::Null);
        assert_eq!(result.error.as_deref(), Some("network error"));
    }
}
