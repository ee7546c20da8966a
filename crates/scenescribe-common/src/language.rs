//! Language tag helpers.
//!
//! Metadata providers report languages as English names ("Korean"), ISO 639-2
//! codes ("kor") or ISO 639-1 codes ("ko"). Subtitle artifacts and remote
//! subtitle searches use two-letter tags, so everything funnels through
//! [`to_two_letter`].

/// Tag used when a subtitle's language cannot be determined.
pub const UNKNOWN: &str = "unknown";

/// Language names with a fixed two-letter tag.
const NAME_TO_CODE: &[(&str, &str)] = &[
    ("english", "en"),
    ("korean", "ko"),
    ("chinese", "zh"),
    ("mandarin", "zh"),
    ("cantonese", "zh"),
    ("japanese", "ja"),
    ("french", "fr"),
    ("spanish", "es"),
    ("german", "de"),
    ("italian", "it"),
    ("russian", "ru"),
];

/// ISO 639-2 codes commonly found in container tags and OCR language packs.
const ISO639_2_TO_1: &[(&str, &str)] = &[
    ("eng", "en"),
    ("kor", "ko"),
    ("chi", "zh"),
    ("zho", "zh"),
    ("chi_sim", "zh"),
    ("chi_tra", "zh"),
    ("jpn", "ja"),
    ("fre", "fr"),
    ("fra", "fr"),
    ("spa", "es"),
    ("ger", "de"),
    ("deu", "de"),
    ("ita", "it"),
    ("rus", "ru"),
    ("por", "pt"),
    ("dut", "nl"),
    ("nld", "nl"),
    ("swe", "sv"),
    ("pol", "pl"),
    ("tur", "tr"),
    ("ara", "ar"),
    ("hin", "hi"),
];

/// Map a language name to the tag used for remote subtitle searches.
///
/// Known names map through a fixed table; anything else falls back to its
/// first two lowercase letters. Returns `None` for blank input.
///
/// # Examples
///
/// ```
/// use scenescribe_common::language::search_code;
///
/// assert_eq!(search_code("Korean").as_deref(), Some("ko"));
/// assert_eq!(search_code("Portuguese").as_deref(), Some("po"));
/// assert_eq!(search_code("  "), None);
/// ```
pub fn search_code(name: &str) -> Option<String> {
    let lower = name.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if let Some((_, code)) = NAME_TO_CODE.iter().find(|(n, _)| *n == lower) {
        return Some((*code).to_string());
    }
    Some(lower.chars().take(2).collect())
}

/// Normalize a container/OCR language tag to a two-letter code.
///
/// Two-letter ASCII input is passed through lowercased, known ISO 639-2 codes
/// and language names are mapped, and everything else becomes
/// [`UNKNOWN`].
///
/// # Examples
///
/// ```
/// use scenescribe_common::language::to_two_letter;
///
/// assert_eq!(to_two_letter("eng"), "en");
/// assert_eq!(to_two_letter("FR"), "fr");
/// assert_eq!(to_two_letter("und"), "unknown");
/// ```
pub fn to_two_letter(tag: &str) -> String {
    let lower = tag.trim().to_lowercase();
    if lower.len() == 2 && lower.chars().all(|c| c.is_ascii_alphabetic()) {
        return lower;
    }
    ISO639_2_TO_1
        .iter()
        .chain(NAME_TO_CODE.iter())
        .find(|(k, _)| *k == lower)
        .map(|(_, v)| (*v).to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
