//! The conversation-flow state machine: decides the next conversation state
//! from (current state, intents, slots, history) (§4.3).

pub mod slot_table;
mod transitions;

use std::collections::HashMap;

use voice_agent_core::intent::MultiIntentResult;
use voice_agent_core::session::ConversationState;
use voice_agent_core::slot::{ConversationSlot, SlotName};
use voice_agent_core::Intent;
use voice_agent_slots::{ConfirmationAnswer, SlotExtractor};

pub use slot_table::SlotRequirement;
pub use transitions::is_allowed_transition;

pub fn slot_requirement(intent: Intent) -> Option<&'static SlotRequirement> {
    slot_table::SLOT_TABLE.get(&intent)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    InitiateTransfer,
    EndCallGracefully,
    RequestComplaintDetails,
    AskClarification,
    AskForSlot(SlotName),
    GenerateSummary,
    ProceedToExecution,
    OfferUpsell,
    AskAnythingElse,
}

#[derive(Debug, Clone)]
pub struct FlowDecision {
    pub next_state: ConversationState,
    pub actions: Vec<FlowAction>,
    pub required_slots_outstanding: Vec<SlotName>,
    pub suggested_responses: Vec<String>,
    pub confidence: f32,
    pub reasoning: String,
}

pub struct FlowContext<'a> {
    pub current_state: ConversationState,
    pub detection: &'a MultiIntentResult,
    pub active_slots: &'a HashMap<SlotName, ConversationSlot>,
    pub has_upsell_opportunity: bool,
    pub latest_utterance: &'a str,
}

pub struct FlowController {
    slot_extractor: SlotExtractor,
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowController {
    pub fn new() -> Self {
        Self {
            slot_extractor: SlotExtractor::new(),
        }
    }

    pub fn decide(&self, ctx: &FlowContext) -> FlowDecision {
        let primary = ctx.detection.primary_intent;

        if matches!(primary, Some(Intent::TransferToOperator) | Some(Intent::FallbackToHuman)) {
            return FlowDecision {
                next_state: ConversationState::Escalation,
                actions: vec![FlowAction::InitiateTransfer],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["I'll transfer you to a member of our team now.".to_string()],
                confidence: ctx.detection.intents.first().map(|i| i.confidence).unwrap_or(0.9),
                reasoning: "primary intent is transfer_to_operator or fallback_to_human".to_string(),
            };
        }

        if matches!(primary, Some(Intent::EndCall)) {
            return FlowDecision {
                next_state: ConversationState::Closing,
                actions: vec![FlowAction::EndCallGracefully],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["Thank you for calling, have a wonderful day!".to_string()],
                confidence: ctx.detection.intents.first().map(|i| i.confidence).unwrap_or(0.9),
                reasoning: "primary intent is end_call".to_string(),
            };
        }

        if matches!(primary, Some(Intent::ComplaintFeedback)) {
            return FlowDecision {
                next_state: ConversationState::ProblemSolving,
                actions: vec![FlowAction::RequestComplaintDetails],
                required_slots_outstanding: vec![SlotName::new("complaint_details")],
                suggested_responses: vec![
                    "I'm very sorry to hear that. Could you tell me more about what happened?".to_string(),
                ],
                confidence: ctx.detection.intents.first().map(|i| i.confidence).unwrap_or(0.8),
                reasoning: "primary intent is complaint_feedback".to_string(),
            };
        }

        if ctx.detection.ambiguous || ctx.detection.requires_clarification {
            return FlowDecision {
                next_state: ConversationState::Clarification,
                actions: vec![FlowAction::AskClarification],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec![ctx
                    .detection
                    .clarification_message
                    .clone()
                    .unwrap_or_else(|| "Could you clarify what you'd like to do?".to_string())],
                confidence: 0.5,
                reasoning: "detection result is ambiguous or requires clarification".to_string(),
            };
        }

        let decision = match ctx.current_state {
            ConversationState::Confirmation => self.decide_confirmation(ctx),
            ConversationState::Execution => self.decide_execution(ctx),
            _ => self.decide_slot_filling(ctx, primary),
        };
        tracing::debug!(
            from = ?ctx.current_state,
            to = ?decision.next_state,
            reasoning = %decision.reasoning,
            "flow decision"
        );
        decision
    }

    fn decide_slot_filling(&self, ctx: &FlowContext, primary: Option<Intent>) -> FlowDecision {
        // Absent a primary intent or a slot requirement for one, stay in the
        // current state rather than jumping to `InformationGathering` —
        // that target isn't reachable from every state in the adjacency
        // table (e.g. `SlotFilling`, `Upselling`, `ProblemSolving`,
        // `Escalation`), and `from == to` is always an allowed transition.
        let Some(intent) = primary else {
            return FlowDecision {
                next_state: ctx.current_state,
                actions: vec![],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["How can I help you today?".to_string()],
                confidence: 0.5,
                reasoning: "no primary intent detected".to_string(),
            };
        };

        let Some(requirement) = slot_table::SLOT_TABLE.get(&intent) else {
            return FlowDecision {
                next_state: ctx.current_state,
                actions: vec![],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec![],
                confidence: 0.6,
                reasoning: format!("intent {intent} has no slot requirements, continue gathering information"),
            };
        };

        let missing: Vec<SlotName> = requirement
            .required
            .iter()
            .filter(|name| !ctx.active_slots.contains_key(*name))
            .cloned()
            .collect();

        if missing.is_empty() {
            FlowDecision {
                next_state: ConversationState::Confirmation,
                actions: vec![FlowAction::GenerateSummary],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["Let me confirm what I have so far.".to_string()],
                confidence: 0.85,
                reasoning: format!("all required slots present for intent {intent}"),
            }
        } else {
            let first = missing[0].clone();
            let question = format!("Could you tell me the {}?", first.0.replace('_', " "));
            FlowDecision {
                next_state: ConversationState::SlotFilling,
                actions: vec![FlowAction::AskForSlot(first)],
                required_slots_outstanding: missing,
                suggested_responses: vec![question],
                confidence: 0.75,
                reasoning: format!("missing required slots for intent {intent}"),
            }
        }
    }

    fn decide_confirmation(&self, ctx: &FlowContext) -> FlowDecision {
        match self.slot_extractor.classify_confirmation(ctx.latest_utterance) {
            ConfirmationAnswer::Affirmative => FlowDecision {
                next_state: ConversationState::Execution,
                actions: vec![FlowAction::ProceedToExecution],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["Great, I'll take care of that now.".to_string()],
                confidence: 0.9,
                reasoning: "caller confirmed affirmatively".to_string(),
            },
            ConfirmationAnswer::Negative => FlowDecision {
                next_state: ConversationState::SlotFilling,
                actions: vec![],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["No problem, let's fix that. What would you like to change?".to_string()],
                confidence: 0.8,
                reasoning: "caller declined the summary".to_string(),
            },
            ConfirmationAnswer::Unclear => FlowDecision {
                next_state: ConversationState::Clarification,
                actions: vec![FlowAction::AskClarification],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["Sorry, was that a yes or a no?".to_string()],
                confidence: 0.4,
                reasoning: "caller's confirmation answer was unclear".to_string(),
            },
        }
    }

    fn decide_execution(&self, ctx: &FlowContext) -> FlowDecision {
        if ctx.has_upsell_opportunity {
            FlowDecision {
                next_state: ConversationState::Upselling,
                actions: vec![FlowAction::OfferUpsell],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["Before I let you go, would you like to hear about an upgrade?".to_string()],
                confidence: 0.7,
                reasoning: "an upsell opportunity exists on the session".to_string(),
            }
        } else {
            FlowDecision {
                next_state: ConversationState::Closing,
                actions: vec![FlowAction::AskAnythingElse],
                required_slots_outstanding: Vec::new(),
                suggested_responses: vec!["Is there anything else I can help you with?".to_string()],
                confidence: 0.7,
                reasoning: "execution complete with no upsell opportunity".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_agent_core::intent::DetectedIntent;
    use voice_agent_core::Language;

    fn detection(intent: Intent, confidence: f32) -> MultiIntentResult {
        MultiIntentResult {
            utterance: "test".to_string(),
            intents: vec![DetectedIntent::new(intent, confidence)],
            primary_intent: Some(intent),
            language: Language::english(),
            processing_time_ms: 1,
            ambiguous: false,
            requires_clarification: false,
            clarification_message: None,
        }
    }

    #[test]
    fn transfer_intent_always_escalates() {
        let controller = FlowController::new();
        let detection = detection(Intent::TransferToOperator, 0.9);
        let slots = HashMap::new();
        let ctx = FlowContext {
            current_state: ConversationState::Greeting,
            detection: &detection,
            active_slots: &slots,
            has_upsell_opportunity: false,
            latest_utterance: "transfer me",
        };
        let decision = controller.decide(&ctx);
        assert_eq!(decision.next_state, ConversationState::Escalation);
        assert!(is_allowed_transition(ConversationState::Greeting, decision.next_state));
    }

    #[test]
    fn booking_inquiry_with_missing_slots_asks_for_first() {
        let controller = FlowController::new();
        let detection = detection(Intent::BookingInquiry, 0.9);
        let slots = HashMap::new();
        let ctx = FlowContext {
            current_state: ConversationState::InformationGathering,
            detection: &detection,
            active_slots: &slots,
            has_upsell_opportunity: false,
            latest_utterance: "I want to book a room",
        };
        let decision = controller.decide(&ctx);
        assert_eq!(decision.next_state, ConversationState::SlotFilling);
        assert!(!decision.required_slots_outstanding.is_empty());
    }

    #[test]
    fn booking_inquiry_with_all_slots_moves_to_confirmation() {
        let controller = FlowController::new();
        let detection = detection(Intent::BookingInquiry, 0.9);
        let mut slots = HashMap::new();
        for name in ["check_in_date", "check_out_date", "guest_count"] {
            slots.insert(
                SlotName::new(name),
                ConversationSlot::new(
                    SlotName::new(name),
                    "x",
                    0.9,
                    voice_agent_core::slot::SlotSource::RegexExtraction,
                ),
            );
        }
        let ctx = FlowContext {
            current_state: ConversationState::SlotFilling,
            detection: &detection,
            active_slots: &slots,
            has_upsell_opportunity: false,
            latest_utterance: "that's right",
        };
        let decision = controller.decide(&ctx);
        assert_eq!(decision.next_state, ConversationState::Confirmation);
    }

    #[test]
    fn execution_with_upsell_moves_to_upselling() {
        let controller = FlowController::new();
        let detection = detection(Intent::BookingInquiry, 0.9);
        let slots = HashMap::new();
        let ctx = FlowContext {
            current_state: ConversationState::Execution,
            detection: &detection,
            active_slots: &slots,
            has_upsell_opportunity: true,
            latest_utterance: "",
        };
        let decision = controller.decide(&ctx);
        assert_eq!(decision.next_state, ConversationState::Upselling);
    }
}
