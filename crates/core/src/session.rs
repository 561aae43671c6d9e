//! The call session: the single authoritative record for one active call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CoreError;
use crate::intent::Intent;
use crate::language::Language;
use crate::slot::{ConversationSlot, SlotName};
use crate::turn::ConversationTurn;

/// The current schema version written to persistence. Bump this whenever a
/// field is added, removed, or changes meaning; `CallSession::schema_version`
/// on a deserialized document older than this is a `CoreError::SchemaMismatch`.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallLifecycleState {
    Initializing,
    Connecting,
    Active,
    OnHold,
    Transferring,
    Ending,
    Ended,
    Failed,
}

impl CallLifecycleState {
    /// Lifecycle transitions are monotone forward except `active <-> on_hold`;
    /// once `ended|failed` the session accepts no further mutation (§3).
    pub fn can_transition_to(self, next: CallLifecycleState) -> bool {
        use CallLifecycleState::*;
        if matches!(self, Ended | Failed) {
            return false;
        }
        if self == next {
            return true;
        }
        match (self, next) {
            (Active, OnHold) | (OnHold, Active) => true,
            (Initializing, Connecting | Active | Failed) => true,
            (Connecting, Active | Failed) => true,
            (Active, Transferring | Ending | Failed) => true,
            (OnHold, Transferring | Ending | Failed) => true,
            (Transferring, Active | Ending | Failed) => true,
            (Ending, Ended | Failed) => true,
            _ => false,
        }
    }
}

/// The ten conversation states the flow controller moves between (§4.3).
/// Owned here (rather than in the flow crate) because it is a first-class
/// attribute of `CallSession`, not a detail internal to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    InformationGathering,
    SlotFilling,
    Confirmation,
    Execution,
    Clarification,
    Upselling,
    ProblemSolving,
    Escalation,
    Closing,
}

impl ConversationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConversationState::Closing)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencyAccumulators {
    pub asr_ms: u64,
    pub llm_ms: u64,
    pub tts_ms: u64,
    pub intent_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsellOpportunity {
    pub upgrade_type: String,
    pub description: String,
    pub offered_at: DateTime<Utc>,
}

/// One per active call; the single authoritative record the session manager
/// mutates under the per-call lane and periodically snapshots to the
/// key-value store under `call:<call_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    pub schema_version: u32,
    pub call_id: String,
    pub room_name: String,
    pub hotel_id: String,
    pub caller_participant_id: Option<String>,
    pub detected_language: Language,
    pub lifecycle_state: CallLifecycleState,
    pub conversation_state: ConversationState,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub latencies: LatencyAccumulators,
    pub pms_data: HashMap<String, serde_json::Value>,
    pub escalation_reasons: Vec<String>,
    pub upsell_opportunities: Vec<UpsellOpportunity>,
    pub active_slots: HashMap<SlotName, ConversationSlot>,
    pub completed_slots: HashMap<SlotName, ConversationSlot>,
    pub turns: Vec<ConversationTurn>,
    pub intent_history: Vec<Intent>,
}

impl CallSession {
    pub fn new(call_id: impl Into<String>, room_name: impl Into<String>, hotel_id: impl Into<String>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            call_id: call_id.into(),
            room_name: room_name.into(),
            hotel_id: hotel_id.into(),
            caller_participant_id: None,
            detected_language: Language::english(),
            lifecycle_state: CallLifecycleState::Initializing,
            conversation_state: ConversationState::Greeting,
            created_at: Utc::now(),
            ended_at: None,
            latencies: LatencyAccumulators::default(),
            pms_data: HashMap::new(),
            escalation_reasons: Vec::new(),
            upsell_opportunities: Vec::new(),
            active_slots: HashMap::new(),
            completed_slots: HashMap::new(),
            turns: Vec::new(),
            intent_history: Vec::new(),
        }
    }

    pub fn transition_lifecycle(&mut self, next: CallLifecycleState) -> Result<(), CoreError> {
        if !self.lifecycle_state.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: format!("{:?}", self.lifecycle_state),
                to: format!("{:?}", next),
            });
        }
        self.lifecycle_state = next;
        Ok(())
    }

    pub fn next_turn_index(&self) -> usize {
        self.turns.len()
    }

    pub fn append_turn(&mut self, turn: ConversationTurn) {
        debug_assert_eq!(turn.index, self.turns.len(), "turn index must be contiguous");
        self.turns.push(turn);
    }

    /// Moves a slot from `active_slots` into `completed_slots`; a name
    /// appears in at most one map at any time (§3 invariant).
    pub fn complete_slot(&mut self, name: &SlotName) {
        if let Some(slot) = self.active_slots.remove(name) {
            self.completed_slots.insert(name.clone(), slot);
        }
    }

    pub fn insert_active_slot(&mut self, slot: ConversationSlot) {
        self.completed_slots.remove(&slot.name);
        self.active_slots.insert(slot.name.clone(), slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_rejects_mutation_after_terminal() {
        let mut session = CallSession::new("c1", "r1", "h1");
        session.transition_lifecycle(CallLifecycleState::Active).unwrap();
        session.transition_lifecycle(CallLifecycleState::Ended).unwrap();
        assert!(session
            .transition_lifecycle(CallLifecycleState::Active)
            .is_err());
    }

    #[test]
    fn active_on_hold_round_trip_allowed() {
        let mut session = CallSession::new("c1", "r1", "h1");
        session.transition_lifecycle(CallLifecycleState::Active).unwrap();
        session.transition_lifecycle(CallLifecycleState::OnHold).unwrap();
        session.transition_lifecycle(CallLifecycleState::Active).unwrap();
    }

    #[test]
    fn slot_maps_stay_disjoint() {
        let mut session = CallSession::new("c1", "r1", "h1");
        let slot = ConversationSlot::new(
            SlotName::new("guest_count"),
            "2",
            0.9,
            crate::slot::SlotSource::RegexExtraction,
        );
        session.insert_active_slot(slot);
        session.complete_slot(&SlotName::new("guest_count"));
        assert!(!session.active_slots.contains_key(&SlotName::new("guest_count")));
        assert!(session.completed_slots.contains_key(&SlotName::new("guest_count")));
    }
}
