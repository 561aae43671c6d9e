//! Short-code to TTS-engine-voice-locale mapping (§4.6).

use std::collections::HashMap;

use once_cell::sync::Lazy;

static LANGUAGE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("en", "en-US"),
        ("de", "de-DE"),
        ("es", "es-ES"),
        ("fr", "fr-FR"),
        ("it", "it-IT"),
        ("nl", "nl-NL"),
        ("pt", "pt-PT"),
        ("pl", "pl-PL"),
        ("ru", "ru-RU"),
        ("ja", "ja-JP"),
        ("zh", "zh-CN"),
    ])
});

/// Maps a bare short code to its TTS locale; hyphenated codes pass through
/// unchanged; anything unrecognized falls back to `en-US`.
pub fn resolve_locale(language: &str) -> String {
    if language.contains('-') {
        return language.to_string();
    }
    LANGUAGE_MAP.get(language).copied().unwrap_or("en-US").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_code_maps_to_locale() {
        assert_eq!(resolve_locale("de"), "de-DE");
    }

    #[test]
    fn hyphenated_code_passes_through() {
        assert_eq!(resolve_locale("en-GB"), "en-GB");
    }

    #[test]
    fn unknown_code_falls_back_to_en_us() {
        assert_eq!(resolve_locale("xx"), "en-US");
    }
}
