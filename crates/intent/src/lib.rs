//! Multi-intent detection: maps an utterance and language to a ranked list
//! of intents with confidences, within a bounded wall-clock budget.

mod patterns;

use std::time::Instant;

use voice_agent_core::intent::{DetectedIntent, MultiIntentResult};
use voice_agent_core::{Intent, Language};

/// Confidences at or below 0.2 are dropped (§4.1).
const MIN_KEPT_CONFIDENCE: f32 = 0.2;
/// Intents above this threshold count toward ambiguity detection.
const AMBIGUITY_THRESHOLD: f32 = 0.6;

pub struct IntentDetector;

impl Default for IntentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentDetector {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous by design: pattern evaluation is in-process regex work
    /// with no suspension point, so the caller wraps this in a timeout
    /// rather than the detector managing its own deadline.
    pub fn detect(&self, utterance: &str, language: &Language) -> MultiIntentResult {
        let start = Instant::now();
        let result = self.detect_inner(utterance, language);
        match result {
            Some(mut r) => {
                r.processing_time_ms = start.elapsed().as_millis() as u64;
                r
            }
            None => MultiIntentResult::fallback(utterance, language.clone()),
        }
    }

    fn detect_inner(&self, utterance: &str, language: &Language) -> Option<MultiIntentResult> {
        if utterance.trim().is_empty() {
            return None;
        }
        let family = language.family();
        let utterance_len = utterance.chars().count().max(1) as f32;

        let mut detected: Vec<DetectedIntent> = Vec::new();

        for &intent in Intent::ALL {
            let patterns = patterns::patterns_for(intent, family);
            let mut best_span: Option<usize> = None;
            for pattern in patterns {
                if let Some(m) = pattern.find(utterance) {
                    let span = m.as_str().chars().count();
                    best_span = Some(best_span.map_or(span, |b: usize| b.max(span)));
                }
            }
            let Some(span) = best_span else { continue };

            let coverage_bonus = 0.3 * (span as f32 / utterance_len);
            let mut confidence: f32 = 0.7 + coverage_bonus;
            confidence += intent_specific_boost(intent, utterance);
            confidence = confidence.clamp(0.0, 1.0);

            if confidence > MIN_KEPT_CONFIDENCE {
                detected.push(DetectedIntent::new(intent, confidence));
            }
        }

        detected.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap()
                .then_with(|| b.intent.priority().cmp(&a.intent.priority()))
        });

        let primary_intent = primary_of(&detected);
        let above_threshold = detected
            .iter()
            .filter(|i| i.confidence > AMBIGUITY_THRESHOLD)
            .count();
        let ambiguous = above_threshold >= 2;
        let primary_confidence = primary_intent
            .and_then(|p| detected.iter().find(|d| d.intent == p).map(|d| d.confidence));
        let requires_clarification = ambiguous
            || primary_confidence.map(|c| c < AMBIGUITY_THRESHOLD).unwrap_or(true)
            || detected.is_empty();

        let clarification_message = if requires_clarification {
            let message = clarification_message(&detected);
            tracing::debug!(utterance, ambiguous, "clarification required: {}", message);
            Some(message)
        } else {
            None
        };

        Some(MultiIntentResult {
            utterance: utterance.to_string(),
            intents: detected,
            primary_intent,
            language: language.clone(),
            processing_time_ms: 0,
            ambiguous,
            requires_clarification,
            clarification_message,
        })
    }
}

/// Highest confidence wins; equal confidences are broken by the fixed
/// priority table (§4.1).
fn primary_of(detected: &[DetectedIntent]) -> Option<Intent> {
    detected
        .iter()
        .max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap()
                .then_with(|| a.intent.priority().cmp(&b.intent.priority()))
        })
        .map(|d| d.intent)
}

fn intent_specific_boost(intent: Intent, utterance: &str) -> f32 {
    match intent {
        Intent::EndCall | Intent::TransferToOperator => 0.1,
        Intent::BookingInquiry | Intent::ExistingReservationModify => {
            let mut boost = 0.0;
            if patterns::DATE_TOKEN.is_match(utterance) {
                boost += 0.15;
            }
            if patterns::DURATION_COUNT_TOKEN.is_match(utterance) {
                boost += 0.10;
            }
            boost
        }
        Intent::RestaurantBooking | Intent::SpaBooking | Intent::RoomService => {
            if patterns::TIME_OF_DAY_TOKEN.is_match(utterance) {
                0.10
            } else {
                0.0
            }
        }
        Intent::ComplaintFeedback => {
            let hits = patterns::NEGATIVE_SENTIMENT_TOKENS
                .iter()
                .filter(|re| re.is_match(utterance))
                .count();
            (0.05 * hits as f32).min(0.20)
        }
        _ => 0.0,
    }
}

fn clarification_message(detected: &[DetectedIntent]) -> String {
    if detected.len() >= 2 {
        let names: Vec<String> = detected.iter().take(2).map(|d| d.intent.to_string()).collect();
        format!(
            "I want to make sure I understand — are you asking about {} or {}?",
            names[0], names[1]
        )
    } else {
        "I'm sorry, could you tell me a bit more about what you'd like to do?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_utterance_falls_back() {
        let detector = IntentDetector::new();
        let result = detector.detect("", &Language::english());
        assert!(result.requires_clarification);
        assert!(result.intents.is_empty());
    }

    #[test]
    fn greeting_is_detected_in_english() {
        let detector = IntentDetector::new();
        let result = detector.detect("Hello there", &Language::english());
        assert_eq!(result.primary_intent, Some(Intent::Greeting));
    }

    #[test]
    fn german_booking_inquiry_falls_back_to_german_patterns() {
        let detector = IntentDetector::new();
        let result = detector.detect(
            "Ich möchte ein Zimmer für zwei Personen vom 10.12 bis 12.12 buchen",
            &Language::new("de"),
        );
        assert_eq!(result.primary_intent, Some(Intent::BookingInquiry));
    }

    #[test]
    fn unknown_language_falls_back_to_english_patterns() {
        let detector = IntentDetector::new();
        let result = detector.detect("I would like to book a room", &Language::new("xx"));
        assert_eq!(result.primary_intent, Some(Intent::BookingInquiry));
    }

    #[test]
    fn ambiguous_utterance_requires_clarification() {
        let detector = IntentDetector::new();
        let result = detector.detect("cancel and also book a massage", &Language::english());
        assert!(result.ambiguous);
        assert!(result.requires_clarification);
        assert!(result.intents.iter().any(|i| i.intent == Intent::ExistingReservationCancel));
        assert!(result.intents.iter().any(|i| i.intent == Intent::SpaBooking));
    }

    #[test]
    fn all_confidences_within_bounds() {
        let detector = IntentDetector::new();
        let result = detector.detect(
            "I am so disappointed, this is terrible, awful service, I want to speak to a manager",
            &Language::english(),
        );
        for intent in &result.intents {
            assert!(intent.confidence >= 0.0 && intent.confidence <= 1.0);
        }
    }
}
