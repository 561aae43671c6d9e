//! The closed union of inbound event variants the Session Manager accepts
//! (§4.7, §9 Design Note), and the structured reply every handler returns.

use serde_json::Value;

#[derive(Debug, Clone)]
pub enum CallEvent {
    AgentReady { room_name: String, hotel_id: String },
    CallStarted { room_name: String, participant_id: Option<String> },
    Transcription { room_name: String, text: String, language: String, confidence: f32, is_final: bool },
    Dtmf { room_name: String, digit: String },
    CallEnded { room_name: String },
    Unknown { event_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum ReplyAction {
    Speak,
    Ended,
    Ready,
    Partial,
    DtmfProcessed,
}

impl ReplyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyAction::Speak => "speak",
            ReplyAction::Ended => "ended",
            ReplyAction::Ready => "ready",
            ReplyAction::Partial => "partial",
            ReplyAction::DtmfProcessed => "dtmf_processed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplyMetadata {
    pub tts_engine: Option<String>,
    pub tts_cached: bool,
    pub tts_duration_ms: Option<u64>,
    pub detected_intents: Vec<String>,
    pub primary_intent: Option<String>,
    pub conversation_state: Option<String>,
    pub flow_confidence: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct SessionReply {
    pub status: String,
    pub action: ReplyAction,
    pub text: String,
    pub language: String,
    pub audio_data: Option<String>,
    pub audio_format: Option<String>,
    pub metadata: ReplyMetadata,
}

impl SessionReply {
    pub fn suppressed() -> Self {
        Self {
            status: "suppressed".to_string(),
            action: ReplyAction::Ended,
            text: String::new(),
            language: "en".to_string(),
            audio_data: None,
            audio_format: None,
            metadata: ReplyMetadata::default(),
        }
    }

    pub fn ignored(event_name: &str) -> Self {
        Self {
            status: "ignored".to_string(),
            action: ReplyAction::Ready,
            text: format!("unrecognized event: {event_name}"),
            language: "en".to_string(),
            audio_data: None,
            audio_format: None,
            metadata: ReplyMetadata::default(),
        }
    }
}

/// Parses the generic `/call/event` webhook body into a [`CallEvent`].
pub fn parse_call_event(event: &str, room_name: &str, data: &Value) -> CallEvent {
    match event {
        "agent_ready" => CallEvent::AgentReady {
            room_name: room_name.to_string(),
            hotel_id: data.get("hotel_id").and_then(|v| v.as_str()).unwrap_or("default").to_string(),
        },
        "call_started" => CallEvent::CallStarted {
            room_name: room_name.to_string(),
            participant_id: data.get("participant_id").and_then(|v| v.as_str()).map(str::to_string),
        },
        "transcription" => CallEvent::Transcription {
            room_name: room_name.to_string(),
            text: data.get("text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            language: data.get("language").and_then(|v| v.as_str()).unwrap_or("en").to_string(),
            confidence: data.get("confidence").and_then(|v| v.as_f64()).unwrap_or(1.0) as f32,
            is_final: data.get("is_final").and_then(|v| v.as_bool()).unwrap_or(false),
        },
        "dtmf" => CallEvent::Dtmf {
            room_name: room_name.to_string(),
            digit: data.get("digit").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        },
        "call_ended" => CallEvent::CallEnded { room_name: room_name.to_string() },
        other => CallEvent::Unknown { event_name: other.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_name_parses_to_unknown_variant() {
        let event = parse_call_event("room_joined", "r1", &serde_json::json!({}));
        assert!(matches!(event, CallEvent::Unknown { .. }));
    }

    #[test]
    fn transcription_defaults_is_final_to_false() {
        let event = parse_call_event("transcription", "r1", &serde_json::json!({"text": "hi"}));
        match event {
            CallEvent::Transcription { is_final, .. } => assert!(!is_final),
            _ => panic!("expected transcription variant"),
        }
    }
}
