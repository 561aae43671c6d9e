//! The closed set of intents a caller utterance can be tagged with, and the
//! detection result types produced by the intent detector.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::language::Language;

/// One of the ~18 recognized intent tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    BookingInquiry,
    ExistingReservationModify,
    ExistingReservationCancel,
    AvailabilityCheck,
    UpsellingOpportunity,
    RestaurantBooking,
    SpaBooking,
    RoomService,
    ConciergeServices,
    ComplaintFeedback,
    TransferToOperator,
    FallbackToHuman,
    EndCall,
    InformationRequest,
    PaymentInquiry,
    RatePackageInquiry,
    HotelInfo,
    Unknown,
}

impl Intent {
    /// All tags the detector evaluates patterns for, leaves first.
    pub const ALL: &'static [Intent] = &[
        Intent::EndCall,
        Intent::TransferToOperator,
        Intent::FallbackToHuman,
        Intent::ComplaintFeedback,
        Intent::ExistingReservationCancel,
        Intent::ExistingReservationModify,
        Intent::BookingInquiry,
        Intent::AvailabilityCheck,
        Intent::UpsellingOpportunity,
        Intent::RestaurantBooking,
        Intent::SpaBooking,
        Intent::RoomService,
        Intent::ConciergeServices,
        Intent::PaymentInquiry,
        Intent::RatePackageInquiry,
        Intent::HotelInfo,
        Intent::InformationRequest,
        Intent::Greeting,
    ];

    /// Fixed tie-break priority table from highest to lowest (§4.1).
    pub fn priority(self) -> u8 {
        match self {
            Intent::EndCall => 10,
            Intent::TransferToOperator | Intent::FallbackToHuman => 9,
            Intent::ComplaintFeedback => 8,
            Intent::ExistingReservationCancel => 7,
            Intent::ExistingReservationModify => 6,
            Intent::BookingInquiry | Intent::AvailabilityCheck => 5,
            Intent::UpsellingOpportunity => 4,
            Intent::RestaurantBooking | Intent::SpaBooking | Intent::RoomService => 3,
            Intent::ConciergeServices => 2,
            Intent::InformationRequest | Intent::PaymentInquiry | Intent::RatePackageInquiry | Intent::HotelInfo => 1,
            Intent::Greeting | Intent::Unknown => 0,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        write!(f, "{s}")
    }
}

/// Derived bucket over a confidence score, mirroring the three-level split
/// the original intent detection service reports alongside the raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: f32) -> Self {
        if score < 0.4 {
            ConfidenceLevel::Low
        } else if score < 0.7 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::High
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedIntent {
    pub intent: Intent,
    pub confidence: f32,
    pub confidence_level: ConfidenceLevel,
    pub parameters: HashMap<String, String>,
    #[serde(skip_deserializing, default = "default_detector")]
    pub detector: &'static str,
}

fn default_detector() -> &'static str {
    "regex_pattern_detector"
}

impl DetectedIntent {
    pub fn new(intent: Intent, confidence: f32) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            intent,
            confidence,
            confidence_level: ConfidenceLevel::from_score(confidence),
            parameters: HashMap::new(),
            detector: "regex_pattern_detector",
        }
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiIntentResult {
    pub utterance: String,
    pub intents: Vec<DetectedIntent>,
    pub primary_intent: Option<Intent>,
    pub language: Language,
    pub processing_time_ms: u64,
    pub ambiguous: bool,
    pub requires_clarification: bool,
    pub clarification_message: Option<String>,
}

impl MultiIntentResult {
    /// The result returned when detection cannot run at all (§4.1 "Failure").
    pub fn fallback(utterance: impl Into<String>, language: Language) -> Self {
        Self {
            utterance: utterance.into(),
            intents: Vec::new(),
            primary_intent: None,
            language,
            processing_time_ms: 0,
            ambiguous: false,
            requires_clarification: true,
            clarification_message: Some(
                "I'm sorry, could you say that again?".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_level_buckets() {
        assert_eq!(ConfidenceLevel::from_score(0.1), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.5), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.9), ConfidenceLevel::High);
    }

    #[test]
    fn detected_intent_clamps_confidence() {
        let intent = DetectedIntent::new(Intent::Greeting, 1.5);
        assert_eq!(intent.confidence, 1.0);
        let intent = DetectedIntent::new(Intent::Greeting, -0.5);
        assert_eq!(intent.confidence, 0.0);
    }

    #[test]
    fn priority_table_orders_end_call_highest() {
        assert!(Intent::EndCall.priority() > Intent::TransferToOperator.priority());
        assert!(Intent::Greeting.priority() < Intent::BookingInquiry.priority());
    }

    #[test]
    fn intent_display_is_snake_case() {
        assert_eq!(Intent::BookingInquiry.to_string(), "booking_inquiry");
    }
}
