//! Append-only conversation turn records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::intent::MultiIntentResult;
use crate::language::Language;
use crate::slot::ConversationSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnType {
    Text,
    Dtmf,
    DtmfResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub function_name: String,
    pub success: bool,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub tts_engine: Option<String>,
    pub tts_cached: bool,
    pub tts_duration_ms: Option<u64>,
    pub llm_fallback_used: bool,
    pub llm_latency_ms: Option<u64>,
    pub extra: HashMap<String, String>,
}

/// One append-only entry in a call's conversation history. Turns are never
/// mutated or removed once appended; their index within the session's turn
/// vector is stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub index: usize,
    pub speaker: Speaker,
    pub content: String,
    pub language: Language,
    pub turn_type: TurnType,
    pub created_at: DateTime<Utc>,
    pub detection: Option<MultiIntentResult>,
    pub extracted_slots: Vec<ConversationSlot>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub response_metadata: Option<ResponseMetadata>,
}

impl ConversationTurn {
    pub fn user(index: usize, content: impl Into<String>, language: Language, turn_type: TurnType) -> Self {
        Self {
            index,
            speaker: Speaker::User,
            content: content.into(),
            language,
            turn_type,
            created_at: Utc::now(),
            detection: None,
            extracted_slots: Vec::new(),
            tool_calls: Vec::new(),
            response_metadata: None,
        }
    }

    pub fn assistant(index: usize, content: impl Into<String>, language: Language) -> Self {
        Self {
            index,
            speaker: Speaker::Assistant,
            content: content.into(),
            language,
            turn_type: TurnType::Text,
            created_at: Utc::now(),
            detection: None,
            extracted_slots: Vec::new(),
            tool_calls: Vec::new(),
            response_metadata: None,
        }
    }

    pub fn with_detection(mut self, detection: MultiIntentResult) -> Self {
        self.detection = Some(detection);
        self
    }

    pub fn with_slots(mut self, slots: Vec<ConversationSlot>) -> Self {
        self.extracted_slots = slots;
        self
    }

    pub fn with_response_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.response_metadata = Some(metadata);
        self
    }
}
