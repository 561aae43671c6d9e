//! Language codes used throughout a call.
//!
//! Calls carry either a bare short code (`en`, `de`) or a hyphenated
//! regional variant (`en-US`, `de-DE`); both forms are accepted from
//! upstream services and normalized here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A BCP-47-ish language tag as received from ASR/webhook payloads.
///
/// Kept as a thin wrapper over the original string (so regional variants
/// like `en-GB` round-trip unchanged) with a `family()` accessor for the
/// small set of languages the intent/slot pattern tables and greeting
/// templates actually branch on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

/// The coarse language family used to key pattern tables and localized
/// templates. Anything not in this list falls back to `En`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    En,
    De,
    Es,
    Fr,
    It,
    Nl,
    Pt,
    Pl,
    Ru,
    Ja,
    Zh,
}

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn english() -> Self {
        Self("en".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coarse family derived from the leading subtag, defaulting to English
    /// for anything unrecognized (the intent detector's documented fallback).
    pub fn family(&self) -> LanguageFamily {
        let primary = self.0.split('-').next().unwrap_or("").to_ascii_lowercase();
        match primary.as_str() {
            "de" => LanguageFamily::De,
            "es" => LanguageFamily::Es,
            "fr" => LanguageFamily::Fr,
            "it" => LanguageFamily::It,
            "nl" => LanguageFamily::Nl,
            "pt" => LanguageFamily::Pt,
            "pl" => LanguageFamily::Pl,
            "ru" => LanguageFamily::Ru,
            "ja" => LanguageFamily::Ja,
            "zh" => LanguageFamily::Zh,
            _ => LanguageFamily::En,
        }
    }

    /// Maps a short code to its default regional variant, passes hyphenated
    /// codes through unchanged, and defaults unknown codes to `en-US`.
    pub fn to_regional_variant(&self) -> String {
        if self.0.contains('-') {
            return self.0.clone();
        }
        match self.0.to_ascii_lowercase().as_str() {
            "en" => "en-US",
            "de" => "de-DE",
            "es" => "es-ES",
            "fr" => "fr-FR",
            "it" => "it-IT",
            "nl" => "nl-NL",
            "pt" => "pt-PT",
            "pl" => "pl-PL",
            "ru" => "ru-RU",
            "ja" => "ja-JP",
            "zh" => "zh-CN",
            _ => "en-US",
        }
        .to_string()
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Self(s)
    }
}
