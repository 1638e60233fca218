//! Name sanitizers for station identifiers, display names and output filenames.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // \w is Unicode-aware, so letters of any script survive.
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref UNDERSCORE_RUNS: Regex = Regex::new(r"_{2,}").unwrap();
    static ref NON_ASCII_WORD: Regex = Regex::new(r"[^a-z0-9_]").unwrap();
}

/// Fallback identifier used when sanitization leaves nothing usable.
pub const PLACEHOLDER_NAME: &str = "unknown_song";

/// Normalize a free-form name into a safe identifier: every non-word
/// character becomes an underscore, whitespace and underscore runs collapse
/// to a single underscore, and leading/trailing underscores are stripped.
///
/// Idempotent; an all-punctuation input yields an empty string.
pub fn sanitize_name(raw: &str) -> String {
    let replaced = NON_WORD.replace_all(raw, "_");
    let replaced = WHITESPACE.replace_all(&replaced, "_");
    let replaced = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    replaced.trim_matches('_').to_string()
}

/// Station identifiers are additionally lowercased.
pub fn sanitize_station_name(raw: &str) -> String {
    sanitize_name(raw).to_lowercase()
}

/// Strict ASCII variant used for audio filenames and in-game asset keys:
/// lowercases, then maps everything outside `[a-z0-9_]` to underscores.
pub fn sanitize_ascii(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let replaced = NON_ASCII_WORD.replace_all(&lowered, "_");
    let replaced = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    replaced.trim_matches('_').to_string()
}

/// [`sanitize_ascii`], substituting [`PLACEHOLDER_NAME`] when the result is
/// empty (e.g. a name written entirely in a non-Latin script).
pub fn ascii_or_placeholder(raw: &str) -> String {
    let sanitized = sanitize_ascii(raw);
    if sanitized.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_name_basic() {
        assert_eq!(sanitize_station_name("My Station!!"), "my_station");
        assert_eq!(sanitize_station_name("  Rock & Roll  FM "), "rock_roll_fm");
    }

    #[test]
    fn test_unicode_letters_survive() {
        assert_eq!(sanitize_name("테스트 곡"), "테스트_곡");
        assert_eq!(sanitize_station_name("Радио Звезда"), "радио_звезда");
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "My Station!!",
            "a  b__c",
            "___",
            "",
            "테스트 (remix) [2024]",
            "hello-world.mp3",
        ] {
            let once = sanitize_name(raw);
            assert_eq!(sanitize_name(&once), once, "sanitize not idempotent for {raw:?}");
            let strict = sanitize_ascii(raw);
            assert_eq!(sanitize_ascii(&strict), strict);
        }
    }

    #[test]
    fn test_no_edge_or_doubled_underscores() {
        for raw in ["!!a!!b!!", "  x  ", "__y__", "a...b", "?!."] {
            let out = sanitize_name(raw);
            assert!(!out.starts_with('_'), "leading underscore in {out:?}");
            assert!(!out.ends_with('_'), "trailing underscore in {out:?}");
            assert!(!out.contains("__"), "doubled underscore in {out:?}");
        }
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert_eq!(sanitize_name(""), "");
        assert_eq!(sanitize_name("!!!"), "");
        assert_eq!(sanitize_ascii("테스트"), "");
        assert_eq!(ascii_or_placeholder("테스트"), PLACEHOLDER_NAME);
        assert_eq!(ascii_or_placeholder(""), PLACEHOLDER_NAME);
    }

    #[test]
    fn test_ascii_variant() {
        assert_eq!(sanitize_ascii("Test Song"), "test_song");
        assert_eq!(sanitize_ascii("Song (Official MV) 테스트"), "song_official_mv");
        assert_eq!(ascii_or_placeholder("Test Song"), "test_song");
    }
}
