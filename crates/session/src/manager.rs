//! Owns the authoritative per-call state, routes every inbound event to its
//! handler, and emits a structured reply (§4.7 — "the hardest part").

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use voice_agent_core::language::{Language, LanguageFamily};
use voice_agent_core::session::{CallLifecycleState, ConversationState};
use voice_agent_core::turn::{ConversationTurn, ResponseMetadata, TurnType};
use voice_agent_core::{CallSession, Intent};
use voice_agent_flow::{FlowAction, FlowContext, FlowController};
use voice_agent_intent::IntentDetector;
use voice_agent_llm::LlmCoordinator;
use voice_agent_slots::SlotExtractor;
use voice_agent_tts::{TtsCoordinator, TtsOutcome};

use crate::events::{CallEvent, ReplyAction, ReplyMetadata, SessionReply};
use crate::lane::SessionLane;
use crate::store::SessionStore;
use crate::templates;

pub struct SessionManager {
    sessions: DashMap<String, Arc<SessionLane>>,
    room_index: DashMap<String, String>,
    store: Arc<dyn SessionStore>,
    intent_detector: IntentDetector,
    slot_extractor: SlotExtractor,
    flow_controller: FlowController,
    llm: Arc<LlmCoordinator>,
    tts: Arc<TtsCoordinator>,
    session_ttl_seconds: u64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, llm: Arc<LlmCoordinator>, tts: Arc<TtsCoordinator>, session_ttl_seconds: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            room_index: DashMap::new(),
            store,
            intent_detector: IntentDetector::new(),
            slot_extractor: SlotExtractor::new(),
            flow_controller: FlowController::new(),
            llm,
            tts,
            session_ttl_seconds,
        }
    }

    pub async fn handle_event(&self, event: CallEvent) -> SessionReply {
        match event {
            CallEvent::AgentReady { room_name, hotel_id } => self.handle_agent_ready(room_name, hotel_id).await,
            CallEvent::CallStarted { room_name, participant_id } => self.handle_call_started(room_name, participant_id).await,
            CallEvent::Transcription { room_name, text, language, confidence: _, is_final } => {
                if !is_final {
                    return SessionReply {
                        status: "partial".to_string(),
                        action: ReplyAction::Partial,
                        text: String::new(),
                        language,
                        audio_data: None,
                        audio_format: None,
                        metadata: ReplyMetadata::default(),
                    };
                }
                self.handle_transcription(room_name, text, language).await
            }
            CallEvent::Dtmf { room_name, digit } => self.handle_dtmf(room_name, digit).await,
            CallEvent::CallEnded { room_name } => self.handle_call_ended(room_name).await,
            CallEvent::Unknown { event_name } => {
                tracing::warn!(event_name = %event_name, "ignoring unrecognized call event");
                SessionReply::ignored(&event_name)
            }
        }
    }

    fn lane_for_room(&self, room_name: &str) -> Option<Arc<SessionLane>> {
        let call_id = self.room_index.get(room_name)?;
        self.sessions.get(call_id.value()).map(|entry| entry.clone())
    }

    async fn persist(&self, session: &CallSession) {
        if let Err(e) = self.store.put(session, self.session_ttl_seconds).await {
            tracing::error!(call_id = %session.call_id, error = %e, "failed to persist session snapshot");
        }
    }

    async fn handle_agent_ready(&self, room_name: String, hotel_id: String) -> SessionReply {
        if self.room_index.contains_key(&room_name) {
            tracing::info!(room_name = %room_name, "agent_ready re-delivered for an already-provisioned room");
            return SessionReply {
                status: "ready".to_string(),
                action: ReplyAction::Ready,
                text: String::new(),
                language: "en".to_string(),
                audio_data: None,
                audio_format: None,
                metadata: ReplyMetadata::default(),
            };
        }

        let call_id = Uuid::new_v4().to_string();
        let session = CallSession::new(call_id.clone(), room_name.clone(), hotel_id);
        self.persist(&session).await;

        self.sessions.insert(call_id.clone(), Arc::new(SessionLane::new(session)));
        self.room_index.insert(room_name, call_id);

        SessionReply {
            status: "ready".to_string(),
            action: ReplyAction::Ready,
            text: String::new(),
            language: "en".to_string(),
            audio_data: None,
            audio_format: None,
            metadata: ReplyMetadata::default(),
        }
    }

    async fn handle_call_started(&self, room_name: String, participant_id: Option<String>) -> SessionReply {
        let Some(lane) = self.lane_for_room(&room_name) else {
            tracing::warn!(room_name = %room_name, "call_started for unknown room");
            return SessionReply::ignored("call_started");
        };

        let mut session = lane.lock().await;
        if session.transition_lifecycle(CallLifecycleState::Active).is_err() {
            return SessionReply::ignored("call_started");
        }
        session.caller_participant_id = participant_id;

        let language = session.detected_language.clone();
        let greeting = templates::greeting(language.family());

        let turn_index = session.next_turn_index();
        session.append_turn(ConversationTurn::assistant(turn_index, greeting, language.clone()));

        let tts_outcome = self.tts.synthesize(greeting, language.as_str()).await;
        let metadata = response_metadata_from_tts(&tts_outcome);

        self.persist(&session).await;

        SessionReply {
            status: "started".to_string(),
            action: ReplyAction::Speak,
            text: greeting.to_string(),
            language: language.as_str().to_string(),
            audio_data: audio_from_tts(&tts_outcome),
            audio_format: audio_format_from_tts(&tts_outcome),
            metadata: ReplyMetadata {
                conversation_state: Some(format!("{:?}", session.conversation_state)),
                ..metadata
            },
        }
    }

    async fn handle_transcription(&self, room_name: String, text: String, language: String) -> SessionReply {
        let Some(lane) = self.lane_for_room(&room_name) else {
            tracing::warn!(room_name = %room_name, "transcription for unknown room");
            return SessionReply::ignored("transcription");
        };

        let mut session = lane.lock().await;
        if session.lifecycle_state == CallLifecycleState::Ended {
            return SessionReply::suppressed();
        }

        session.detected_language = Language::new(language.clone());
        let detection = self.intent_detector.detect(&text, &session.detected_language);

        let extracted_slots = match detection.primary_intent.and_then(voice_agent_flow::slot_requirement) {
            Some(requirement) => self.slot_extractor.extract(&text, &requirement.required, &requirement.optional).filled,
            None => Vec::new(),
        };
        for slot in &extracted_slots {
            session.insert_active_slot(slot.clone());
        }

        let turn_index = session.next_turn_index();
        let detected_language = session.detected_language.clone();
        session.append_turn(
            ConversationTurn::user(turn_index, text.clone(), detected_language, TurnType::Text)
                .with_detection(detection.clone())
                .with_slots(extracted_slots.clone()),
        );
        if let Some(primary) = detection.primary_intent {
            session.intent_history.push(primary);
        }

        let decision = self.flow_controller.decide(&FlowContext {
            current_state: session.conversation_state,
            detection: &detection,
            active_slots: &session.active_slots,
            has_upsell_opportunity: !session.upsell_opportunities.is_empty(),
            latest_utterance: &text,
        });

        if voice_agent_flow::is_allowed_transition(session.conversation_state, decision.next_state) {
            session.conversation_state = decision.next_state;
        } else {
            tracing::warn!(
                call_id = %session.call_id,
                from = ?session.conversation_state,
                to = ?decision.next_state,
                reasoning = %decision.reasoning,
                "flow decision rejected: target state unreachable from current state"
            );
        }
        if decision.actions.contains(&FlowAction::InitiateTransfer) {
            session.escalation_reasons.push("caller requested transfer".to_string());
        }

        let hotel_id = session.hotel_id.clone();
        let turns = session.turns.clone();
        let llm_response = self
            .llm
            .respond(&turns, &text, &hotel_id, &mut session.escalation_reasons, detection.primary_intent)
            .await;
        session.latencies.llm_ms += llm_response.metadata.latency_ms;

        let assistant_turn_index = session.next_turn_index();
        let tts_outcome = self.tts.synthesize(&llm_response.text, session.detected_language.as_str()).await;
        let response_metadata = ResponseMetadata {
            tts_engine: tts_engine(&tts_outcome),
            tts_cached: tts_cached(&tts_outcome),
            tts_duration_ms: tts_duration(&tts_outcome),
            llm_fallback_used: llm_response.metadata.fallback_used,
            llm_latency_ms: Some(llm_response.metadata.latency_ms),
            extra: Default::default(),
        };
        let detected_language = session.detected_language.clone();
        session.append_turn(
            ConversationTurn::assistant(assistant_turn_index, llm_response.text.clone(), detected_language)
                .with_response_metadata(response_metadata),
        );

        let reply_metadata = ReplyMetadata {
            detected_intents: detection.intents.iter().map(|i| i.intent.to_string()).collect(),
            primary_intent: detection.primary_intent.map(|i| i.to_string()),
            conversation_state: Some(format!("{:?}", session.conversation_state)),
            flow_confidence: Some(decision.confidence),
            ..response_metadata_from_tts(&tts_outcome)
        };

        self.persist(&session).await;

        if lane.is_ending() {
            return SessionReply::suppressed();
        }

        SessionReply {
            status: "processed".to_string(),
            action: ReplyAction::Speak,
            text: llm_response.text,
            language: session.detected_language.as_str().to_string(),
            audio_data: audio_from_tts(&tts_outcome),
            audio_format: audio_format_from_tts(&tts_outcome),
            metadata: reply_metadata,
        }
    }

    async fn handle_dtmf(&self, room_name: String, digit: String) -> SessionReply {
        let Some(lane) = self.lane_for_room(&room_name) else {
            tracing::warn!(room_name = %room_name, "dtmf for unknown room");
            return SessionReply::ignored("dtmf");
        };

        let mut session = lane.lock().await;
        let family = session.detected_language.family();

        let turn_index = session.next_turn_index();
        let detected_language = session.detected_language.clone();
        session.append_turn(ConversationTurn::user(turn_index, digit.clone(), detected_language, TurnType::Dtmf));

        let (response_text, mapped_intent, next_state): (&str, Option<Intent>, ConversationState) = match digit.as_str() {
            "1" => (templates::dtmf_menu(family), Some(Intent::BookingInquiry), ConversationState::InformationGathering),
            "2" => (templates::dtmf_menu(family), Some(Intent::InformationRequest), ConversationState::InformationGathering),
            "3" => (templates::dtmf_menu(family), Some(Intent::ConciergeServices), ConversationState::InformationGathering),
            "4" => (templates::dtmf_menu(family), Some(Intent::SpaBooking), ConversationState::InformationGathering),
            "0" => (templates::operator_transfer(family), Some(Intent::TransferToOperator), ConversationState::Escalation),
            "*" => (templates::greeting(family), None, ConversationState::Greeting),
            "#" => (templates::dtmf_menu(family), None, ConversationState::InformationGathering),
            _ => (templates::dtmf_menu(family), None, session.conversation_state),
        };

        if let Some(intent) = mapped_intent {
            session.intent_history.push(intent);
        }
        if voice_agent_flow::is_allowed_transition(session.conversation_state, next_state) {
            session.conversation_state = next_state;
        } else {
            tracing::warn!(
                call_id = %session.call_id,
                from = ?session.conversation_state,
                to = ?next_state,
                digit = %digit,
                "dtmf transition rejected: target state unreachable from current state"
            );
        }

        // Digits that escalate to a human get a plain spoken reply; the
        // rest are acknowledged as processed touch-tone input (§8 scenario 4).
        let reply_action = if matches!(mapped_intent, Some(Intent::TransferToOperator)) {
            ReplyAction::Speak
        } else {
            ReplyAction::DtmfProcessed
        };

        let assistant_turn_index = session.next_turn_index();
        let detected_language = session.detected_language.clone();
        session.append_turn(ConversationTurn::assistant(assistant_turn_index, response_text, detected_language));

        let tts_outcome = self.tts.synthesize(response_text, session.detected_language.as_str()).await;
        let metadata = ReplyMetadata {
            primary_intent: mapped_intent.map(|i| i.to_string()),
            conversation_state: Some(format!("{:?}", session.conversation_state)),
            ..response_metadata_from_tts(&tts_outcome)
        };

        self.persist(&session).await;

        SessionReply {
            status: "processed".to_string(),
            action: reply_action,
            text: response_text.to_string(),
            language: session.detected_language.as_str().to_string(),
            audio_data: audio_from_tts(&tts_outcome),
            audio_format: audio_format_from_tts(&tts_outcome),
            metadata,
        }
    }

    async fn handle_call_ended(&self, room_name: String) -> SessionReply {
        let Some(lane) = self.lane_for_room(&room_name) else {
            return SessionReply::ignored("call_ended");
        };
        // Set eagerly, without waiting for the lock, so a turn already
        // in flight on this lane can suppress its own reply once it
        // finishes mutating (§5).
        lane.mark_ending();

        let call_id = {
            let mut session = lane.lock().await;
            let _ = session.transition_lifecycle(CallLifecycleState::Ending);
            let _ = session.transition_lifecycle(CallLifecycleState::Ended);
            session.conversation_state = ConversationState::Closing;
            session.ended_at = Some(chrono::Utc::now());
            self.persist(&session).await;
            session.call_id.clone()
        };

        self.sessions.remove(&call_id);
        self.room_index.remove(&room_name);

        SessionReply {
            status: "ended".to_string(),
            action: ReplyAction::Ended,
            text: String::new(),
            language: "en".to_string(),
            audio_data: None,
            audio_format: None,
            metadata: ReplyMetadata::default(),
        }
    }
}

fn tts_engine(outcome: &TtsOutcome) -> Option<String> {
    match outcome {
        TtsOutcome::Synthesized(artifact) => Some(artifact.engine_used.clone()),
        TtsOutcome::NotSynthesized => None,
    }
}

fn tts_cached(outcome: &TtsOutcome) -> bool {
    matches!(outcome, TtsOutcome::Synthesized(artifact) if artifact.cached)
}

fn tts_duration(outcome: &TtsOutcome) -> Option<u64> {
    match outcome {
        TtsOutcome::Synthesized(artifact) => Some(artifact.duration_ms),
        TtsOutcome::NotSynthesized => None,
    }
}

fn audio_from_tts(outcome: &TtsOutcome) -> Option<String> {
    match outcome {
        TtsOutcome::Synthesized(artifact) => Some(artifact.audio_base64.clone()),
        TtsOutcome::NotSynthesized => None,
    }
}

fn audio_format_from_tts(outcome: &TtsOutcome) -> Option<String> {
    match outcome {
        TtsOutcome::Synthesized(_) => Some("mp3".to_string()),
        TtsOutcome::NotSynthesized => None,
    }
}

fn response_metadata_from_tts(outcome: &TtsOutcome) -> ReplyMetadata {
    ReplyMetadata {
        tts_engine: tts_engine(outcome),
        tts_cached: tts_cached(outcome),
        tts_duration_ms: tts_duration(outcome),
        ..ReplyMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use voice_agent_llm::{LlmBackend, LlmCoordinator};
    use voice_agent_tools::{PmsConnectorFactory, StubPmsConnectorFactory, ToolDispatcher};

    struct EchoBackend;

    #[async_trait::async_trait]
    impl LlmBackend for EchoBackend {
        async fn generate(
            &self,
            _messages: &[voice_agent_llm::Message],
            _tools: &[serde_json::Value],
            _max_tokens: u32,
        ) -> Result<voice_agent_llm::GenerationResult, voice_agent_llm::LlmError> {
            Ok(voice_agent_llm::GenerationResult {
                text: "Sure, I can help with that.".to_string(),
                tool_calls: vec![],
                finish_reason: voice_agent_llm::FinishReason::Stop,
                latency_ms: 1,
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn manager() -> SessionManager {
        let store: Arc<dyn SessionStore> = Arc::new(crate::store::InMemorySessionStore::default());
        let factory: StdArc<dyn PmsConnectorFactory> = StdArc::new(StubPmsConnectorFactory);
        let dispatcher = StdArc::new(ToolDispatcher::new(factory));
        let backend: StdArc<dyn LlmBackend> = StdArc::new(EchoBackend);
        let llm = StdArc::new(LlmCoordinator::new(backend, dispatcher, "VoiceHive Hotel", "en"));
        let tts = StdArc::new(TtsCoordinator::new("http://localhost:1").unwrap());
        SessionManager::new(store, llm, tts, 3600)
    }

    #[tokio::test]
    async fn cold_greeting_english() {
        let manager = manager();
        manager
            .handle_event(CallEvent::AgentReady { room_name: "r1".to_string(), hotel_id: "h1".to_string() })
            .await;
        let reply = manager
            .handle_event(CallEvent::CallStarted { room_name: "r1".to_string(), participant_id: Some("p1".to_string()) })
            .await;
        assert_eq!(reply.status, "started");
        assert_eq!(reply.action, ReplyAction::Speak);
        assert!(reply.text.contains("Welcome to VoiceHive Hotel"));
    }

    #[tokio::test]
    async fn redelivered_agent_ready_does_not_duplicate_session() {
        let manager = manager();
        manager
            .handle_event(CallEvent::AgentReady { room_name: "r1".to_string(), hotel_id: "h1".to_string() })
            .await;
        manager
            .handle_event(CallEvent::AgentReady { room_name: "r1".to_string(), hotel_id: "h1".to_string() })
            .await;
        assert_eq!(manager.sessions.len(), 1);
    }

    #[tokio::test]
    async fn dtmf_zero_initiates_transfer() {
        let manager = manager();
        manager
            .handle_event(CallEvent::AgentReady { room_name: "r1".to_string(), hotel_id: "h1".to_string() })
            .await;
        manager
            .handle_event(CallEvent::CallStarted { room_name: "r1".to_string(), participant_id: None })
            .await;
        let reply = manager.handle_event(CallEvent::Dtmf { room_name: "r1".to_string(), digit: "0".to_string() }).await;
        assert_eq!(reply.text, templates::operator_transfer(LanguageFamily::En));
        assert_eq!(reply.metadata.conversation_state.as_deref(), Some("Escalation"));
        assert_eq!(reply.action, ReplyAction::Speak);
    }

    #[tokio::test]
    async fn dtmf_menu_digit_is_reported_as_dtmf_processed() {
        let manager = manager();
        manager
            .handle_event(CallEvent::AgentReady { room_name: "r1".to_string(), hotel_id: "h1".to_string() })
            .await;
        manager
            .handle_event(CallEvent::CallStarted { room_name: "r1".to_string(), participant_id: None })
            .await;
        let reply = manager.handle_event(CallEvent::Dtmf { room_name: "r1".to_string(), digit: "1".to_string() }).await;
        assert_eq!(reply.action, ReplyAction::DtmfProcessed);
    }

    #[tokio::test]
    async fn call_ended_evicts_the_session() {
        let manager = manager();
        manager
            .handle_event(CallEvent::AgentReady { room_name: "r1".to_string(), hotel_id: "h1".to_string() })
            .await;
        manager.handle_event(CallEvent::CallEnded { room_name: "r1".to_string() }).await;
        assert!(manager.sessions.is_empty());
        assert!(manager.room_index.is_empty());
    }

    struct SlowBackend;

    #[async_trait::async_trait]
    impl LlmBackend for SlowBackend {
        async fn generate(
            &self,
            _messages: &[voice_agent_llm::Message],
            _tools: &[serde_json::Value],
            _max_tokens: u32,
        ) -> Result<voice_agent_llm::GenerationResult, voice_agent_llm::LlmError> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(voice_agent_llm::GenerationResult {
                text: "One moment while I check that.".to_string(),
                tool_calls: vec![],
                finish_reason: voice_agent_llm::FinishReason::Stop,
                latency_ms: 50,
            })
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn call_ended_during_in_flight_turn_suppresses_its_reply() {
        let store: Arc<dyn SessionStore> = Arc::new(crate::store::InMemorySessionStore::default());
        let factory: StdArc<dyn PmsConnectorFactory> = StdArc::new(StubPmsConnectorFactory);
        let dispatcher = StdArc::new(ToolDispatcher::new(factory));
        let backend: StdArc<dyn LlmBackend> = StdArc::new(SlowBackend);
        let llm = StdArc::new(LlmCoordinator::new(backend, dispatcher, "VoiceHive Hotel", "en"));
        let tts = StdArc::new(TtsCoordinator::new("http://localhost:1").unwrap());
        let manager = SessionManager::new(store, llm, tts, 3600);

        manager
            .handle_event(CallEvent::AgentReady { room_name: "r1".to_string(), hotel_id: "h1".to_string() })
            .await;
        manager
            .handle_event(CallEvent::CallStarted { room_name: "r1".to_string(), participant_id: None })
            .await;

        let turn = manager.handle_event(CallEvent::Transcription {
            room_name: "r1".to_string(),
            text: "I'd like to book a room".to_string(),
            language: "en".to_string(),
            confidence: 1.0,
            is_final: true,
        });
        let hangup = async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            manager.handle_event(CallEvent::CallEnded { room_name: "r1".to_string() }).await
        };

        let (turn_reply, hangup_reply) = tokio::join!(turn, hangup);
        assert_eq!(turn_reply.status, "suppressed");
        assert_eq!(hangup_reply.status, "ended");
    }
}
