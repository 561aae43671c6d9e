//! Localized greeting, DTMF menu, and operator-transfer strings (§4.7).
//! German, Spanish, French and English are listed explicitly; any other
//! language falls back to English.

use voice_agent_core::language::LanguageFamily;

pub fn greeting(family: LanguageFamily) -> &'static str {
    match family {
        LanguageFamily::De => "Willkommen im VoiceHive Hotel! Wie kann ich Ihnen helfen?",
        LanguageFamily::Es => "¡Bienvenido al VoiceHive Hotel! ¿En qué puedo ayudarle?",
        LanguageFamily::Fr => "Bienvenue au VoiceHive Hotel ! Comment puis-je vous aider ?",
        _ => "Welcome to VoiceHive Hotel! How can I help you today?",
    }
}

pub fn dtmf_menu(family: LanguageFamily) -> &'static str {
    match family {
        LanguageFamily::De => "Drücken Sie 1 für Buchungen, 2 für Informationen, 3 für Concierge, 4 für Spa, oder 0 für einen Mitarbeiter.",
        LanguageFamily::Es => "Pulse 1 para reservas, 2 para información, 3 para conserjería, 4 para spa, o 0 para hablar con un agente.",
        LanguageFamily::Fr => "Appuyez sur 1 pour les réservations, 2 pour les informations, 3 pour la conciergerie, 4 pour le spa, ou 0 pour un agent.",
        _ => "Press 1 for bookings, 2 for information, 3 for concierge services, 4 for spa, or 0 to speak with an agent.",
    }
}

pub fn operator_transfer(family: LanguageFamily) -> &'static str {
    match family {
        LanguageFamily::De => "Ich verbinde Sie jetzt mit einem Mitarbeiter.",
        LanguageFamily::Es => "Le transfiero ahora con un miembro de nuestro equipo.",
        LanguageFamily::Fr => "Je vous transfère maintenant à un membre de notre équipe.",
        _ => "I'll transfer you to a member of our team now.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_language_falls_back_to_english() {
        assert!(greeting(LanguageFamily::Ja).contains("Welcome"));
    }

    #[test]
    fn german_greeting_is_localized() {
        assert!(greeting(LanguageFamily::De).contains("Willkommen"));
    }
}
