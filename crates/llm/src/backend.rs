//! The `LlmBackend` trait and its OpenAI-compatible chat-completions
//! implementation.
//!
//! The orchestrator talks to exactly one collaborator LLM per deployment,
//! addressed by `collaborators.llm_url` (an Azure OpenAI or any other
//! OpenAI-compatible chat-completions endpoint). The trait exists so tests
//! can substitute a stub backend without a network call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::LlmError;
use crate::prompt::Message;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            endpoint: "http://localhost:9003/v1/chat/completions".to_string(),
            api_key: None,
            max_tokens: 200,
            temperature: 0.7,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    Other,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub tool_calls: Vec<RawToolCall>,
    pub finish_reason: FinishReason,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Value],
        max_tokens: u32,
    ) -> Result<GenerationResult, LlmError>;

    fn model_name(&self) -> &str;
}

/// Talks to any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleBackend {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatibleBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatFunctionCall,
}

#[derive(Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Value],
        max_tokens: u32,
    ) -> Result<GenerationResult, LlmError> {
        let started = std::time::Instant::now();

        let mut request = self.client.post(&self.config.endpoint).json(&ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens,
            tools: tools.to_vec(),
        });

        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(LlmError::Api(format!("llm endpoint returned {}", response.status())));
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in llm response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .filter_map(|tc| {
                serde_json::from_str::<Value>(&tc.function.arguments)
                    .ok()
                    .map(|arguments| RawToolCall {
                        id: tc.id,
                        name: tc.function.name,
                        arguments,
                    })
            })
            .collect::<Vec<_>>();

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("length") => FinishReason::Length,
            Some("stop") => FinishReason::Stop,
            _ => FinishReason::Other,
        };

        Ok(GenerationResult {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
