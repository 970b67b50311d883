//! Phone-number language classification.
//!
//! A pure, total function: any input yields a language code. The calling
//! code table is matched longest-prefix-first so a short code can never
//! shadow a more specific one (e.g. `+1 787` Puerto Rico resolves to
//! Spanish even though `1` alone maps to English).

use std::sync::OnceLock;

/// Language used when no calling code matches.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Calling code → language. Order here is irrelevant; matching always
/// runs over the table sorted by prefix length, longest first.
const CALLING_CODES: &[(&str, &str)] = &[
    ("1", "en"),    // NANP
    ("1787", "es"), // Puerto Rico
    ("1939", "es"), // Puerto Rico
    ("30", "en"),   // Greece (no localized content yet)
    ("31", "en"),   // Netherlands
    ("32", "fr"),   // Belgium
    ("33", "fr"),   // France
    ("34", "es"),   // Spain
    ("351", "pt"),  // Portugal
    ("352", "fr"),  // Luxembourg
    ("353", "en"),  // Ireland
    ("39", "it"),   // Italy
    ("41", "de"),   // Switzerland
    ("43", "de"),   // Austria
    ("44", "en"),   // United Kingdom
    ("49", "de"),   // Germany
    ("52", "es"),   // Mexico
    ("54", "es"),   // Argentina
    ("55", "pt"),   // Brazil
    ("56", "es"),   // Chile
    ("57", "es"),   // Colombia
];

fn sorted_codes() -> &'static Vec<(&'static str, &'static str)> {
    static SORTED: OnceLock<Vec<(&'static str, &'static str)>> = OnceLock::new();
    SORTED.get_or_init(|| {
        let mut codes = CALLING_CODES.to_vec();
        // Longest prefix first: most specific match wins.
        codes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        codes
    })
}

/// Strip the channel prefix and everything that is not a digit.
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Classify a raw phone string into a language code.
///
/// Accepts any formatting, including the `whatsapp:` channel prefix.
pub fn language_for_phone(phone: &str) -> &'static str {
    let digits = digits_only(phone);

    for (code, language) in sorted_codes() {
        if digits.starts_with(code) {
            return language;
        }
    }

    DEFAULT_LANGUAGE
}
