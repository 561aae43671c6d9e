//! Prompt assembly: the system prompt, conversation history, and the
//! per-intent canned-response fallback table used when the LLM is
//! unavailable or times out (§4.5 point 6).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use voice_agent_core::turn::{ConversationTurn, Speaker};
use voice_agent_core::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_call_id: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_call_id: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// The last three user/assistant turns are carried verbatim into the prompt
/// (§4.5).
pub(crate) const HISTORY_TURNS: usize = 3;

pub struct PromptBuilder {
    system_prompt: String,
}

impl PromptBuilder {
    pub fn new(hotel_name: &str, language: &str) -> Self {
        Self {
            system_prompt: format!(
                "You are a helpful voice assistant answering phone calls for {hotel_name}. \
                 Respond briefly and naturally, as if speaking aloud, in {language}. \
                 Use the available tools to look up or change reservations rather than guessing."
            ),
        }
    }

    /// Builds the message list from the last `history_turns` conversation
    /// turns plus the latest caller utterance.
    pub fn build(&self, history: &[ConversationTurn], latest_utterance: &str, history_turns: usize) -> Vec<Message> {
        let mut messages = vec![Message::system(self.system_prompt.clone())];
        for turn in history.iter().rev().take(history_turns).collect::<Vec<_>>().into_iter().rev() {
            let message = match turn.speaker {
                Speaker::User => Message::user(turn.content.clone()),
                Speaker::Assistant => Message::assistant(turn.content.clone()),
            };
            messages.push(message);
        }
        messages.push(Message::user(latest_utterance.to_string()));
        messages
    }
}

/// Canned responses keyed by intent, used when the LLM backend is down or
/// the tool loop exceeds its timeout budget (§4.5 point 6 — the system must
/// never go silent).
pub static TEMPLATE_FALLBACKS: Lazy<HashMap<Intent, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(Intent::Greeting, "Hello, thank you for calling. How can I help you today?");
    map.insert(Intent::BookingInquiry, "I'm having trouble reaching our booking system right now. Could you hold for just a moment?");
    map.insert(Intent::ExistingReservationModify, "I'm sorry, I'm unable to pull up reservation details at the moment. Let me transfer you to a member of our team.");
    map.insert(Intent::ExistingReservationCancel, "I'm sorry, I'm unable to process cancellations right now. Let me transfer you to a member of our team.");
    map.insert(Intent::AvailabilityCheck, "I'm having trouble checking availability right now. Could you hold for just a moment?");
    map.insert(Intent::UpsellingOpportunity, "I'm having trouble pulling up our upgrade options right now. Could you hold for just a moment?");
    map.insert(Intent::RestaurantBooking, "I'm having trouble reaching our restaurant booking system right now. Could you hold for just a moment?");
    map.insert(Intent::SpaBooking, "I'm having trouble reaching our spa booking system right now. Could you hold for just a moment?");
    map.insert(Intent::RoomService, "I'm sorry, I'm unable to place room service orders right now. Let me transfer you to a member of our team.");
    map.insert(Intent::ConciergeServices, "I'm having trouble reaching our concierge desk right now. Let me transfer you to a member of our team.");
    map.insert(Intent::ComplaintFeedback, "I'm very sorry for the trouble. Let me connect you with someone who can help right away.");
    map.insert(Intent::TransferToOperator, "Of course, let me transfer you now.");
    map.insert(Intent::FallbackToHuman, "Let me connect you with a member of our team who can help.");
    map.insert(Intent::EndCall, "Thank you for calling, have a wonderful day!");
    map.insert(Intent::InformationRequest, "I'm having trouble looking that up right now. Could you hold for just a moment?");
    map.insert(Intent::PaymentInquiry, "I'm sorry, I'm unable to pull up billing details right now. Let me transfer you to a member of our team.");
    map.insert(Intent::RatePackageInquiry, "I'm having trouble checking our rates and packages right now. Could you hold for just a moment?");
    map.insert(Intent::HotelInfo, "I'm having trouble pulling up that information right now. Could you hold for just a moment?");
    map.insert(Intent::Unknown, "I'm sorry, could you say that again?");
    map
});

pub fn template_fallback(intent: Option<Intent>) -> &'static str {
    intent
        .and_then(|i| TEMPLATE_FALLBACKS.get(&i).copied())
        .unwrap_or("I'm sorry, I'm having trouble processing that right now. Let me transfer you to a member of our team.")
}

/// Converts a tool-dispatcher schema into an OpenAI-style function tool
/// definition for the `tools` field of a chat-completions request.
pub fn tool_definition(name: &str, description: &str, required_fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = required_fields
        .iter()
        .map(|field| (field.to_string(), serde_json::json!({"type": "string"})))
        .collect();

    serde_json::json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required_fields,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_fallback_for_unknown_intent_is_generic() {
        assert!(template_fallback(None).contains("transfer"));
    }

    #[test]
    fn template_fallback_for_greeting_is_specific() {
        assert_eq!(template_fallback(Some(Intent::Greeting)), TEMPLATE_FALLBACKS[&Intent::Greeting]);
    }

    #[test]
    fn prompt_builder_caps_history_length() {
        use voice_agent_core::language::Language;
        use voice_agent_core::turn::TurnType;

        let builder = PromptBuilder::new("Hotel Example", "en");
        let lang = Language::english();
        let history = vec![
            ConversationTurn::user(0, "hi", lang.clone(), TurnType::Text),
            ConversationTurn::assistant(1, "hello", lang.clone()),
            ConversationTurn::user(2, "book a room", lang.clone(), TurnType::Text),
            ConversationTurn::assistant(3, "sure, for how many nights?", lang.clone()),
            ConversationTurn::user(4, "two nights", lang, TurnType::Text),
        ];
        let messages = builder.build(&history, "starting tomorrow", HISTORY_TURNS);
        // system prompt + HISTORY_TURNS capped history + the latest utterance
        assert_eq!(messages.len(), HISTORY_TURNS + 2);
        assert_eq!(messages[1].content, "book a room");
    }
}
