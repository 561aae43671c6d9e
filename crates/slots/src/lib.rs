//! Regex-based structured slot extraction (§4.2).

mod patterns;

use voice_agent_core::slot::{ConversationSlot, SlotName, SlotSource};

/// Below this a regex match is discarded rather than kept as a low-confidence
/// slot (§4.2: "below 0.6 the slot is discarded").
const MIN_SLOT_CONFIDENCE: f32 = 0.6;
/// A successful regex match is assigned this confidence.
const MATCH_CONFIDENCE: f32 = 0.8;
/// At most two clarification questions are returned per extraction.
const MAX_CLARIFICATION_QUESTIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Date,
    Time,
    Count,
    RoomNumber,
    ConfirmationCode,
    RoomType,
    SpaServiceType,
}

fn classify(name: &SlotName) -> Option<SlotKind> {
    match name.0.as_str() {
        "check_in_date" | "check_out_date" | "new_check_in" | "new_check_out" | "date" => {
            Some(SlotKind::Date)
        }
        "time" | "delivery_time" => Some(SlotKind::Time),
        "guest_count" | "party_size" => Some(SlotKind::Count),
        "room_number" => Some(SlotKind::RoomNumber),
        "confirmation_number" => Some(SlotKind::ConfirmationCode),
        "room_type" | "new_room_type" => Some(SlotKind::RoomType),
        "service_type" => Some(SlotKind::SpaServiceType),
        _ => None,
    }
}

fn clarification_question(name: &SlotName) -> String {
    match name.0.as_str() {
        "check_in_date" => "What date would you like to check in?".to_string(),
        "check_out_date" => "What date would you like to check out?".to_string(),
        "guest_count" => "How many guests will be staying?".to_string(),
        "confirmation_number" => "Could you give me your confirmation number?".to_string(),
        "party_size" => "How many people will be in your party?".to_string(),
        "date" => "What date works for you?".to_string(),
        "time" => "What time would you prefer?".to_string(),
        "service_type" => "Which service would you like to book?".to_string(),
        "room_number" => "What's your room number?".to_string(),
        other => format!("Could you provide the {other}?"),
    }
    .replace('_', " ")
}

#[derive(Debug, Clone)]
pub struct SlotExtractionResult {
    pub filled: Vec<ConversationSlot>,
    pub missing_required: Vec<SlotName>,
    pub confidence: f32,
    pub clarification_questions: Vec<String>,
}

pub struct SlotExtractor;

impl Default for SlotExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        utterance: &str,
        required: &[SlotName],
        optional: &[SlotName],
    ) -> SlotExtractionResult {
        let ordered: Vec<&SlotName> = required.iter().chain(optional.iter()).collect();
        let mut filled: Vec<ConversationSlot> = Vec::new();

        let date_slots: Vec<&SlotName> = ordered
            .iter()
            .copied()
            .filter(|n| classify(n) == Some(SlotKind::Date))
            .collect();
        if !date_slots.is_empty() {
            let matches = find_dates(utterance);
            for (slot_name, value) in date_slots.into_iter().zip(matches) {
                filled.push(ConversationSlot::new(
                    slot_name.clone(),
                    value,
                    MATCH_CONFIDENCE,
                    SlotSource::RegexExtraction,
                ));
            }
        }

        for name in &ordered {
            if filled.iter().any(|s| &s.name == *name) {
                continue;
            }
            let Some(kind) = classify(name) else { continue };
            if kind == SlotKind::Date {
                continue; // handled above
            }
            if let Some(value) = extract_single(kind, utterance) {
                filled.push(ConversationSlot::new(
                    (*name).clone(),
                    value,
                    MATCH_CONFIDENCE,
                    SlotSource::RegexExtraction,
                ));
            }
        }

        filled.retain(|s| s.confidence >= MIN_SLOT_CONFIDENCE);

        let missing_required: Vec<SlotName> = required
            .iter()
            .filter(|n| !filled.iter().any(|s| &s.name == *n))
            .cloned()
            .collect();

        let universe = required.len() + optional.len();
        let confidence = if universe == 0 {
            1.0
        } else {
            filled.len() as f32 / universe as f32
        };

        let clarification_questions = missing_required
            .iter()
            .take(MAX_CLARIFICATION_QUESTIONS)
            .map(clarification_question)
            .collect();

        if !missing_required.is_empty() {
            tracing::debug!(?missing_required, confidence, "slots still missing after extraction");
        }

        SlotExtractionResult {
            filled,
            missing_required,
            confidence,
            clarification_questions,
        }
    }

    /// Classifies the most recent user utterance against the fixed
    /// affirmative/negative token set used by the confirmation state (§4.3).
    pub fn classify_confirmation(&self, utterance: &str) -> ConfirmationAnswer {
        if patterns::AFFIRMATIVE_TOKENS.is_match(utterance) {
            ConfirmationAnswer::Affirmative
        } else if patterns::NEGATIVE_TOKENS.is_match(utterance) {
            ConfirmationAnswer::Negative
        } else {
            ConfirmationAnswer::Unclear
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationAnswer {
    Affirmative,
    Negative,
    Unclear,
}

fn find_dates(utterance: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    for m in patterns::DATE_NUMERIC.captures_iter(utterance) {
        let whole = m.get(0).unwrap();
        let day = &m[1];
        let month = &m[2];
        found.push((whole.start(), format!("{day}/{month}")));
    }
    for m in patterns::DATE_RELATIVE.find_iter(utterance) {
        found.push((m.start(), m.as_str().to_lowercase()));
    }
    for m in patterns::DATE_MONTH_NAME.find_iter(utterance) {
        found.push((m.start(), m.as_str().to_string()));
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, v)| v).collect()
}

fn extract_single(kind: SlotKind, utterance: &str) -> Option<String> {
    match kind {
        SlotKind::Date => find_dates(utterance).into_iter().next(),
        SlotKind::Time => {
            if let Some(m) = patterns::TIME_CLOCK.find(utterance) {
                Some(m.as_str().to_string())
            } else if let Some(m) = patterns::TIME_HOUR_AMPM.find(utterance) {
                Some(m.as_str().to_string())
            } else {
                patterns::TIME_NAMED.find(utterance).map(|m| m.as_str().to_lowercase())
            }
        }
        SlotKind::Count => {
            if let Some(c) = patterns::COUNT_FOR_N.captures(utterance) {
                return Some(c[1].to_string());
            }
            if let Some(c) = patterns::COUNT_N_PEOPLE.captures(utterance) {
                return Some(c[1].to_string());
            }
            patterns::COUNT_WORD
                .find(utterance)
                .and_then(|m| patterns::word_to_number(m.as_str()))
                .map(|n| n.to_string())
        }
        SlotKind::RoomNumber => patterns::ROOM_NUMBER.captures(utterance).and_then(|c| {
            c.get(1).or_else(|| c.get(2)).map(|m| m.as_str().to_string())
        }),
        SlotKind::ConfirmationCode => patterns::CONFIRMATION_CODE
            .find(utterance)
            .map(|m| m.as_str().to_string()),
        SlotKind::RoomType => {
            let lower = utterance.to_lowercase();
            patterns::ROOM_TYPES
                .iter()
                .find(|t| lower.contains(**t))
                .map(|t| t.to_string())
        }
        SlotKind::SpaServiceType => {
            let lower = utterance.to_lowercase();
            patterns::SPA_SERVICES
                .iter()
                .find(|t| lower.contains(**t))
                .map(|t| t.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_check_in_and_check_out_in_order() {
        let extractor = SlotExtractor::new();
        let required = vec![
            SlotName::new("check_in_date"),
            SlotName::new("check_out_date"),
            SlotName::new("guest_count"),
        ];
        let result = extractor.extract(
            "I want to book from 10.12 to 12.12 for two people",
            &required,
            &[],
        );
        let check_in = result.filled.iter().find(|s| s.name.0 == "check_in_date").unwrap();
        let check_out = result.filled.iter().find(|s| s.name.0 == "check_out_date").unwrap();
        assert_eq!(check_in.value, "10/12");
        assert_eq!(check_out.value, "12/12");
        let guests = result.filled.iter().find(|s| s.name.0 == "guest_count").unwrap();
        assert_eq!(guests.value, "2");
        assert!(result.missing_required.is_empty());
    }

    #[test]
    fn german_word_number_is_extracted() {
        let extractor = SlotExtractor::new();
        let required = vec![SlotName::new("guest_count")];
        let result = extractor.extract("zwei Personen", &required, &[]);
        assert_eq!(result.filled[0].value, "2");
    }

    #[test]
    fn missing_required_slots_produce_clarification_questions() {
        let extractor = SlotExtractor::new();
        let required = vec![SlotName::new("confirmation_number")];
        let result = extractor.extract("I'd like to change something", &required, &[]);
        assert_eq!(result.missing_required, vec![SlotName::new("confirmation_number")]);
        assert_eq!(result.clarification_questions.len(), 1);
    }

    #[test]
    fn clarification_question_cap_is_two() {
        let extractor = SlotExtractor::new();
        let required = vec![
            SlotName::new("check_in_date"),
            SlotName::new("check_out_date"),
            SlotName::new("guest_count"),
        ];
        let result = extractor.extract("hello", &required, &[]);
        assert_eq!(result.missing_required.len(), 3);
        assert_eq!(result.clarification_questions.len(), 2);
    }

    #[test]
    fn confirmation_classification() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.classify_confirmation("yes that's correct"), ConfirmationAnswer::Affirmative);
        assert_eq!(extractor.classify_confirmation("no that's wrong"), ConfirmationAnswer::Negative);
        assert_eq!(extractor.classify_confirmation("maybe"), ConfirmationAnswer::Unclear);
    }
}
