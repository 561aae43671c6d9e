//! Named structured parameters extracted from a caller utterance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A slot name. Kept as a wrapped string rather than a closed enum because
/// the per-intent required/optional slot tables (§4.3) name slots that
/// don't correspond to a fixed extraction type (e.g. `current_reservation`,
/// `modification_type`) alongside the ones the extractor fills directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotName(pub String);

impl SlotName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SlotName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    RegexExtraction,
    Dtmf,
    LlmInference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSlot {
    pub name: SlotName,
    pub value: String,
    pub confidence: f32,
    pub source: SlotSource,
    pub filled_at: DateTime<Utc>,
    pub confirmed: bool,
}

impl ConversationSlot {
    pub fn new(name: SlotName, value: impl Into<String>, confidence: f32, source: SlotSource) -> Self {
        Self {
            name,
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            filled_at: Utc::now(),
            confirmed: false,
        }
    }
}
