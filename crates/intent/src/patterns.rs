//! Static `(intent, language) -> patterns` table plus the small set of
//! auxiliary token regexes used by the intent-specific confidence boosts.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use voice_agent_core::language::LanguageFamily;
use voice_agent_core::Intent;

fn re(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("static intent pattern must compile")
}

/// English patterns, evaluated for every language as the documented fallback
/// when no patterns are registered for the requested language family.
static ENGLISH_PATTERNS: Lazy<HashMap<Intent, Vec<Regex>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        Intent::Greeting,
        vec![re(r"\b(hello|hi|hey|good (morning|afternoon|evening))\b")],
    );
    m.insert(
        Intent::BookingInquiry,
        vec![
            re(r"\b(book|reserve|reservation|availability|vacancy)\b.*\b(room|suite|stay)\b"),
            re(r"\bi('d| would) like to (book|reserve)\b"),
            re(r"\bdo you have (a room|any rooms|availability)\b"),
        ],
    );
    m.insert(
        Intent::AvailabilityCheck,
        vec![re(r"\b(any|check) (rooms?|availability) (available|free|open)\b")],
    );
    m.insert(
        Intent::ExistingReservationModify,
        vec![re(r"\b(change|modify|update|move) (my|the) (reservation|booking)\b")],
    );
    m.insert(
        Intent::ExistingReservationCancel,
        vec![re(r"\bcancel\b")],
    );
    m.insert(
        Intent::UpsellingOpportunity,
        vec![re(r"\b(upgrade|better room|suite upgrade)\b")],
    );
    m.insert(
        Intent::RestaurantBooking,
        vec![re(r"\b(table|restaurant|dinner|lunch|breakfast) (reservation|booking|for)\b")],
    );
    m.insert(
        Intent::SpaBooking,
        // service token and booking verb can appear in either order
        // ("book a massage" and "massage appointment" both count).
        vec![
            re(r"\b(spa|massage|facial|manicure|pedicure)\b.*\b(book|appointment|schedule)\b"),
            re(r"\b(book|appointment|schedule)\b.*\b(spa|massage|facial|manicure|pedicure)\b"),
        ],
    );
    m.insert(
        Intent::RoomService,
        vec![re(r"\broom service\b"), re(r"\bsend (up|some) (food|drinks|towels)\b")],
    );
    m.insert(
        Intent::ConciergeServices,
        vec![re(r"\b(concierge|recommend|recommendation)\b.*\b(restaurant|tour|attraction|taxi)\b")],
    );
    m.insert(
        Intent::ComplaintFeedback,
        vec![re(r"\b(complain|complaint|unhappy|disappointed|terrible|awful|problem with)\b")],
    );
    m.insert(
        Intent::TransferToOperator,
        vec![re(r"\b(speak to|talk to|transfer me to) (a )?(human|person|operator|manager)\b")],
    );
    m.insert(
        Intent::EndCall,
        vec![re(r"\b(goodbye|bye|that('?s| is) all|hang up|end (the )?call)\b")],
    );
    m.insert(
        Intent::PaymentInquiry,
        vec![re(r"\b(pay|payment|bill|invoice|charge)\b")],
    );
    m.insert(
        Intent::RatePackageInquiry,
        vec![re(r"\b(rate|price|package|deal|discount)s?\b")],
    );
    m.insert(
        Intent::HotelInfo,
        vec![re(r"\b(check[- ]?in|check[- ]?out) time\b"), re(r"\bwhere is the (hotel|pool|gym|parking)\b")],
    );
    m.insert(
        Intent::InformationRequest,
        vec![re(r"\b(what|when|where|how) (is|are|do|does|can)\b")],
    );
    m
});

/// Supplementary non-English patterns. Only a handful of intents/languages
/// are populated; everything else falls back to `ENGLISH_PATTERNS`.
static OTHER_PATTERNS: Lazy<HashMap<(Intent, LanguageFamily), Vec<Regex>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        (Intent::BookingInquiry, LanguageFamily::De),
        vec![
            re(r"\b(zimmer|buchen|reservierung|reservieren)\b"),
            re(r"\bich (möchte|will) (ein )?zimmer\b"),
        ],
    );
    m.insert(
        (Intent::ExistingReservationCancel, LanguageFamily::De),
        vec![re(r"\bstornieren\b")],
    );
    m.insert(
        (Intent::Greeting, LanguageFamily::De),
        vec![re(r"\b(hallo|guten (morgen|tag|abend))\b")],
    );
    m.insert(
        (Intent::BookingInquiry, LanguageFamily::Es),
        vec![re(r"\b(reservar|habitación|disponibilidad)\b")],
    );
    m.insert(
        (Intent::BookingInquiry, LanguageFamily::Fr),
        vec![re(r"\b(réserver|chambre|disponibilité)\b")],
    );
    m
});

pub fn patterns_for(intent: Intent, family: LanguageFamily) -> &'static [Regex] {
    if family != LanguageFamily::En {
        if let Some(patterns) = OTHER_PATTERNS.get(&(intent, family)) {
            return patterns;
        }
    }
    ENGLISH_PATTERNS
        .get(&intent)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// A recognizable date token: numeric `DD/MM`-ish or `DD.MM`, named months,
/// or relative terms. Used for the booking/modify confidence boost.
pub static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    re(r"\b(\d{1,2}[./]\d{1,2}|today|tomorrow|next week|jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|jun(e)?|jul(y)?|aug(ust)?|sep(tember)?|oct(ober)?|nov(ember)?|dec(ember)?)\b")
});

/// A night/day/week count token for the same boost.
pub static DURATION_COUNT_TOKEN: Lazy<Regex> =
    Lazy::new(|| re(r"\b\d+\s*(night|nights|day|days|week|weeks)\b"));

/// A time-of-day token for restaurant/spa/room-service boosts.
pub static TIME_OF_DAY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    re(r"\b(\d{1,2}(:\d{2})?\s*(am|pm)|morning|afternoon|evening|noon|midnight)\b")
});

/// Negative-sentiment tokens for the complaint boost (§4.1: +0.05 each,
/// capped at +0.20).
pub static NEGATIVE_SENTIMENT_TOKENS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"\bterrible\b"),
        re(r"\bawful\b"),
        re(r"\bdisappointed\b"),
        re(r"\bunacceptable\b"),
        re(r"\bworst\b"),
        re(r"\bdisgusting\b"),
        re(r"\brude\b"),
        re(r"\bfilthy\b"),
    ]
});
