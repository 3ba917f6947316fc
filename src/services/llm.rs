//! LLM client interface: a `Role` enum, a `Message` shape carrying `Arc<str>`
//! content, and a `send_message` entry point returning a response plus
//! optional token usage.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

#[derive(Debug)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: Arc<str>,
}

impl LlmMessage {
    pub fn system(content: impl Into<Arc<str>>) -> Self {
        Self { role: LlmRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<Arc<str>>) -> Self {
        Self { role: LlmRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<Arc<str>>) -> Self {
        Self { role: LlmRole::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlmUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// A completed LLM call: text plus whatever usage the backend reported.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<LlmUsage>,
}

/// Per-call overrides. `json_mode` asks the backend to constrain output to
/// valid JSON where it supports doing so natively.
#[derive(Debug, Clone, Copy)]
pub struct LlmCallOptions {
    pub temperature: f32,
    pub json_mode: bool,
}

impl Default for LlmCallOptions {
    fn default() -> Self {
        Self { temperature: 0.0, json_mode: false }
    }
}

/// Injectable LLM boundary. Every master graph node that needs model
/// judgment (planner, decision gate, synthesizer, artifact decision) goes
/// through this trait, never a concrete provider SDK — provider selection
/// happens at orchestrator construction time.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn send_message(&self, messages: &[LlmMessage]) -> Result<LlmResponse, BoxError> {
        self.send_message_with_options(messages, LlmCallOptions::default()).await
    }

    async fn send_message_with_options(&self, messages: &[LlmMessage], options: LlmCallOptions) -> Result<LlmResponse, BoxError>;

    /// Human-readable model identifier, surfaced in trace records.
    fn model_name(&self) -> &str;
}

/// Thin adapter over an OpenAI-compatible `/chat/completions` endpoint.
/// Talks to whatever base URL is configured over plain `reqwest`, the same
/// way `services::search`/`services::extract` talk to Tavily.
pub struct HttpLlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

fn role_str(role: LlmRole) -> &'static str {
    match role {
        LlmRole::System => "system",
        LlmRole::User => "user",
        LlmRole::Assistant => "assistant",
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn send_message_with_options(&self, messages: &[LlmMessage], options: LlmCallOptions) -> Result<LlmResponse, BoxError> {
        let payload_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| serde_json::json!({"role": role_str(m.role), "content": m.content.as_ref()}))
            .collect();
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": payload_messages,
            "temperature": options.temperature,
        });
        if options.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let payload: serde_json::Value = resp.json().await?;
        let content = payload["choices"][0]["message"]["content"].as_str().unwrap_or_default().to_string();
        let usage = payload.get("usage").map(|u| LlmUsage {
            input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: u["total_tokens"].as_u64().unwrap_or(0) as u32,
        });
        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_doubles {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed, caller-supplied response regardless of input.
    /// Records every call's messages for assertion.
    pub struct ScriptedLlmClient {
        pub response: String,
        pub calls: Mutex<Vec<Vec<LlmMessage>>>,
    }

    impl ScriptedLlmClient {
        pub fn new(response: impl Into<String>) -> Self {
            Self { response: response.into(), calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlmClient {
        async fn send_message_with_options(&self, messages: &[LlmMessage], _options: LlmCallOptions) -> Result<LlmResponse, BoxError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            Ok(LlmResponse { content: self.response.clone(), usage: None })
        }

        fn model_name(&self) -> &str {
            "scripted-test-model"
        }
    }

    impl Clone for LlmMessage {
        fn clone(&self) -> Self {
            Self { role: self.role, content: self.content.clone() }
        }
    }
}
