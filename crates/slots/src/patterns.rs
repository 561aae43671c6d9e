use once_cell::sync::Lazy;
use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("static slot pattern must compile")
}

pub static DATE_NUMERIC: Lazy<Regex> = Lazy::new(|| re(r"\b(\d{1,2})[./](\d{1,2})\b"));
pub static DATE_RELATIVE: Lazy<Regex> = Lazy::new(|| re(r"\b(today|tomorrow|next week)\b"));
pub static DATE_MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    re(r"\b(\d{1,2})\s*(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b")
});

pub static TIME_CLOCK: Lazy<Regex> = Lazy::new(|| re(r"\b(\d{1,2}):(\d{2})\s*(am|pm)?\b"));
pub static TIME_HOUR_AMPM: Lazy<Regex> = Lazy::new(|| re(r"\b(\d{1,2})\s*(am|pm)\b"));
pub static TIME_NAMED: Lazy<Regex> = Lazy::new(|| re(r"\b(morning|afternoon|evening|noon|midnight)\b"));

pub static COUNT_FOR_N: Lazy<Regex> = Lazy::new(|| re(r"\bfor\s+(\d+)\b"));
pub static COUNT_N_PEOPLE: Lazy<Regex> =
    Lazy::new(|| re(r"\b(\d+)\s*(people|guests?|pax|persons?)\b"));

pub static ROOM_NUMBER: Lazy<Regex> = Lazy::new(|| re(r"\broom\s*(\d{3,4})\b|\b(\d{3,4})\b"));

/// Deliberately case-sensitive: confirmation codes are uppercase
/// alphanumeric strings, and matching case-insensitively would pick up
/// ordinary lowercase words of the same length.
pub static CONFIRMATION_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z0-9]{6,})\b").expect("static slot pattern must compile"));

pub const ROOM_TYPES: &[&str] = &[
    "single", "double", "twin", "queen", "king", "suite", "deluxe", "family",
];

pub const SPA_SERVICES: &[&str] = &[
    "massage", "facial", "manicure", "pedicure", "sauna",
];

/// Small written-number lookup covering the languages the pattern tables
/// already special-case (English, German) for "N people" phrasing that
/// uses a word instead of a digit (e.g. "zwei Personen").
pub fn word_to_number(word: &str) -> Option<u32> {
    let w = word.to_ascii_lowercase();
    let n = match w.as_str() {
        "one" | "eins" | "ein" => 1,
        "two" | "zwei" => 2,
        "three" | "drei" => 3,
        "four" | "vier" => 4,
        "five" | "fünf" | "fuenf" => 5,
        "six" | "sechs" => 6,
        "seven" | "sieben" => 7,
        "eight" | "acht" => 8,
        "nine" | "neun" => 9,
        "ten" | "zehn" => 10,
        _ => return None,
    };
    Some(n)
}

pub static COUNT_WORD: Lazy<Regex> = Lazy::new(|| {
    re(r"\b(one|two|three|four|five|six|seven|eight|nine|ten|eins|zwei|drei|vier|fünf|fuenf|sechs|sieben|acht|neun|zehn)\b")
});

pub static AFFIRMATIVE_TOKENS: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(yes|yeah|yep|sure|correct|that'?s right|confirm(ed)?|ok(ay)?)\b"));
pub static NEGATIVE_TOKENS: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(no|nope|not (right|correct)|wrong|cancel that|incorrect)\b"));
