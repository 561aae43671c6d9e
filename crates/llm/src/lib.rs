//! The LLM coordinator: assembles a prompt, runs a bounded two-round-trip
//! tool-call loop against the collaborator LLM, and falls back to a canned
//! template response if the backend is unavailable or the loop times out
//! (§4.5).

pub mod backend;
pub mod prompt;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use voice_agent_core::turn::ConversationTurn;
use voice_agent_core::Intent;
use voice_agent_tools::{ToolContext, ToolDispatcher, ToolName};

pub use backend::{FinishReason, GenerationResult, LlmBackend, LlmConfig, OpenAiCompatibleBackend, RawToolCall};
pub use prompt::{tool_definition, Message, PromptBuilder, Role, TEMPLATE_FALLBACKS};

const ROUND_TRIP_TIMEOUT: Duration = Duration::from_millis(voice_agent_config::constants::timeouts::LLM_ROUND_TRIP_MS);
const LOOP_TIMEOUT: Duration = Duration::from_millis(voice_agent_config::constants::timeouts::LLM_LOOP_MS);
const FIRST_CALL_MAX_TOKENS: u32 = 200;
const FOLLOW_UP_MAX_TOKENS: u32 = 150;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("generation error: {0}")]
    Generation(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("timeout")]
    Timeout,
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LlmMetadata {
    pub fallback_used: bool,
    pub latency_ms: u64,
    pub tool_calls_made: usize,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub metadata: LlmMetadata,
}

/// All sixteen tool-dispatcher functions, advertised to the LLM as OpenAI
/// function-tool definitions (§4.4).
fn tool_catalog() -> Vec<Value> {
    ToolName::ALL
        .iter()
        .map(|t| tool_definition(t.as_str(), &format!("Call the {} hotel operation", t.as_str()), t.required_fields()))
        .collect()
}

pub struct LlmCoordinator {
    backend: Arc<dyn LlmBackend>,
    dispatcher: Arc<ToolDispatcher>,
    prompt_builder: PromptBuilder,
}

impl LlmCoordinator {
    pub fn new(backend: Arc<dyn LlmBackend>, dispatcher: Arc<ToolDispatcher>, hotel_name: &str, language: &str) -> Self {
        Self {
            backend,
            dispatcher,
            prompt_builder: PromptBuilder::new(hotel_name, language),
        }
    }

    /// Runs the bounded tool loop: one call with tools enabled (temperature
    /// 0.7, 200 max tokens), and if the model requests a tool, a second call
    /// with the tool results folded in and tools disabled (150 max tokens).
    /// Falls back to a canned template if either round-trip or the whole
    /// loop exceeds its budget, or the backend errors.
    pub async fn respond(
        &self,
        history: &[ConversationTurn],
        latest_utterance: &str,
        hotel_id: &str,
        escalation_reasons: &mut Vec<String>,
        primary_intent: Option<Intent>,
    ) -> LlmResponse {
        match tokio::time::timeout(LOOP_TIMEOUT, self.respond_inner(history, latest_utterance, hotel_id, escalation_reasons)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "llm coordinator falling back to template");
                self.fallback(primary_intent)
            }
            Err(_) => {
                tracing::warn!("llm tool loop exceeded its overall timeout budget");
                self.fallback(primary_intent)
            }
        }
    }

    fn fallback(&self, primary_intent: Option<Intent>) -> LlmResponse {
        LlmResponse {
            text: prompt::template_fallback(primary_intent).to_string(),
            metadata: LlmMetadata { fallback_used: true, latency_ms: 0, tool_calls_made: 0 },
        }
    }

    async fn respond_inner(
        &self,
        history: &[ConversationTurn],
        latest_utterance: &str,
        hotel_id: &str,
        escalation_reasons: &mut Vec<String>,
    ) -> Result<LlmResponse, LlmError> {
        let mut messages = self.prompt_builder.build(history, latest_utterance, prompt::HISTORY_TURNS);

        let first = tokio::time::timeout(
            ROUND_TRIP_TIMEOUT,
            self.backend.generate(&messages, &tool_catalog(), FIRST_CALL_MAX_TOKENS),
        )
        .await
        .map_err(|_| LlmError::Timeout)??;

        if first.tool_calls.is_empty() {
            return Ok(LlmResponse {
                text: first.text,
                metadata: LlmMetadata { fallback_used: false, latency_ms: first.latency_ms, tool_calls_made: 0 },
            });
        }

        let mut tool_calls_made = 0usize;
        for call in &first.tool_calls {
            let Ok(tool) = ToolName::from_str(&call.name) else {
                messages.push(Message::tool_result(call.id.clone(), format!("Unknown function: {}", call.name)));
                continue;
            };
            let mut ctx = ToolContext { hotel_id, escalation_reasons: &mut *escalation_reasons };
            let result = self.dispatcher.dispatch(tool.as_str(), call.arguments.clone(), &mut ctx).await;
            tool_calls_made += 1;
            let content = if result.success {
                result.result.to_string()
            } else {
                format!("error: {}", result.error.unwrap_or_default())
            };
            messages.push(Message::tool_result(call.id.clone(), content));
        }

        let second = tokio::time::timeout(
            ROUND_TRIP_TIMEOUT,
            self.backend.generate(&messages, &[], FOLLOW_UP_MAX_TOKENS),
        )
        .await
        .map_err(|_| LlmError::Timeout)??;

        Ok(LlmResponse {
            text: second.text,
            metadata: LlmMetadata {
                fallback_used: false,
                latency_ms: first.latency_ms + second.latency_ms,
                tool_calls_made,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use voice_agent_tools::{PmsConnectorFactory, StubPmsConnectorFactory};

    struct StubBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmBackend for StubBackend {
        async fn generate(&self, _messages: &[Message], tools: &[Value], _max_tokens: u32) -> Result<GenerationResult, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 && !tools.is_empty() {
                Ok(GenerationResult {
                    text: String::new(),
                    tool_calls: vec![RawToolCall { id: "call_1".to_string(), name: "get_hotel_info".to_string(), arguments: serde_json::json!({}) }],
                    finish_reason: FinishReason::ToolCalls,
                    latency_ms: 5,
                })
            } else {
                Ok(GenerationResult {
                    text: "Check-in is at 3pm.".to_string(),
                    tool_calls: vec![],
                    finish_reason: FinishReason::Stop,
                    latency_ms: 5,
                })
            }
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn dispatcher() -> Arc<ToolDispatcher> {
        let factory: Arc<dyn PmsConnectorFactory> = Arc::new(StubPmsConnectorFactory);
        Arc::new(ToolDispatcher::new(factory))
    }

    #[tokio::test]
    async fn tool_loop_runs_second_round_trip_after_a_tool_call() {
        let backend: Arc<dyn LlmBackend> = Arc::new(StubBackend { calls: AtomicUsize::new(0) });
        let coordinator = LlmCoordinator::new(backend, dispatcher(), "Hotel Example", "en");
        let mut reasons = Vec::new();
        let response = coordinator
            .respond(&[], "what time is check-in?", "h1", &mut reasons, Some(Intent::HotelInfo))
            .await;
        assert!(!response.metadata.fallback_used);
        assert_eq!(response.metadata.tool_calls_made, 1);
        assert_eq!(response.text, "Check-in is at 3pm.");
    }

    struct FailingBackend;

    #[async_trait]
    impl LlmBackend for FailingBackend {
        async fn generate(&self, _messages: &[Message], _tools: &[Value], _max_tokens: u32) -> Result<GenerationResult, LlmError> {
            Err(LlmError::Api("connection refused".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_template() {
        let backend: Arc<dyn LlmBackend> = Arc::new(FailingBackend);
        let coordinator = LlmCoordinator::new(backend, dispatcher(), "Hotel Example", "en");
        let mut reasons = Vec::new();
        let response = coordinator
            .respond(&[], "book a room", "h1", &mut reasons, Some(Intent::BookingInquiry))
            .await;
        assert!(response.metadata.fallback_used);
        assert!(!response.text.is_empty());
    }

    #[test]
    fn tool_catalog_covers_all_sixteen_functions() {
        assert_eq!(tool_catalog().len(), ToolName::ALL.len());
    }
}
