//! Confidence scoring for resolved timestamps.
//!
//! The score is a 0-100 heuristic built from what the text shows (timezone,
//! meridiem, four-digit year, seconds) and how it was matched. It is not a
//! probability.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::PatternMatch;
use super::timezones;

pub const BASE: i32 = 60;
pub const TIMEZONE_BONUS: i32 = 15;
pub const MERIDIEM_BONUS: i32 = 10;
pub const FOUR_DIGIT_YEAR_BONUS: i32 = 10;
pub const SECONDS_BONUS: i32 = 5;
pub const EXACT_PRIMARY_BONUS: i32 = 15;
pub const FALLBACK_PENALTY: i32 = 15;
pub const SHORT_TEXT_PENALTY: i32 = 15;
pub const NO_YEAR_PENALTY: i32 = 20;
pub const AMBIGUOUS_ORDER_PENALTY: i32 = 10;
pub const LOCALIZED_PENALTY: i32 = 5;

/// Texts shorter than this carry too little context to trust
pub const SHORT_TEXT_CHARS: usize = 12;

static FOUR_DIGIT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(?:19|20)\d{2}(?:\D|$)").expect("year regex compiles"));

static MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:AM|PM)\b").expect("meridiem regex compiles"));

static SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d:\d{2}:\d{2}").expect("seconds regex compiles"));

/// Signals read off the text itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextSignals {
    pub has_timezone: bool,
    pub has_meridiem: bool,
    pub has_four_digit_year: bool,
    pub has_seconds: bool,
    pub is_short: bool,
}

impl TextSignals {
    pub fn read(text: &str) -> Self {
        Self {
            has_timezone: timezones::find(text).is_some(),
            has_meridiem: MERIDIEM.is_match(text),
            has_four_digit_year: FOUR_DIGIT_YEAR.is_match(text),
            has_seconds: SECONDS.is_match(text),
            is_short: text.chars().count() < SHORT_TEXT_CHARS,
        }
    }
}

/// Score `signals`, adjusted by how the text was matched (if it was)
pub fn score(signals: &TextSignals, matched: Option<&PatternMatch>) -> u8 {
    let mut score = BASE;

    if signals.has_timezone {
        score += TIMEZONE_BONUS;
    }
    if signals.has_meridiem {
        score += MERIDIEM_BONUS;
    }
    if signals.has_four_digit_year {
        score += FOUR_DIGIT_YEAR_BONUS;
    } else {
        score -= NO_YEAR_PENALTY;
    }
    if signals.has_seconds {
        score += SECONDS_BONUS;
    }
    if signals.is_short {
        score -= SHORT_TEXT_PENALTY;
    }

    if let Some(found) = matched {
        if found.is_exact_primary() {
            score += EXACT_PRIMARY_BONUS;
        }
        if found.is_fallback() {
            score -= FALLBACK_PENALTY;
        }
        if found.ambiguous_order {
            score -= AMBIGUOUS_ORDER_PENALTY;
        }
        if found.localized {
            score -= LOCALIZED_PENALTY;
        }
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::timestamp::patterns::{FALLBACK, PRIMARY, PatternDef, find_first};

    fn scored(patterns: &[PatternDef], text: &str) -> u8 {
        let found = find_first(patterns, [text]).0.unwrap();
        score(&TextSignals::read(&found.text), Some(&found))
    }

    #[test]
    fn test_signals() {
        let signals = TextSignals::read("Aug 11, 2025, 10:30:00 PM CDT");
        assert!(signals.has_timezone);
        assert!(signals.has_meridiem);
        assert!(signals.has_four_digit_year);
        assert!(signals.has_seconds);
        assert!(!signals.is_short);
    }

    #[test]
    fn test_full_primary_scores_high() {
        assert_eq!(scored(&PRIMARY, "Aug 11, 2025, 10:30:00 PM CDT"), 100);
    }

    #[test]
    fn test_timezone_and_meridiem_never_lower_score() {
        let with = scored(&PRIMARY, "Aug 11, 2025, 10:30:00 PM CDT");
        let without = scored(&PRIMARY, "Aug 11, 2025, 10:30:00");
        assert!(with >= without);

        let with = scored(&PRIMARY, "08/11/2025, 10:30 PM EST");
        let without = scored(&PRIMARY, "08/11/2025, 10:30");
        assert!(with >= without);
    }

    #[test]
    fn test_fallback_and_ambiguity_penalties() {
        let primary = scored(&PRIMARY, "2025-08-11 22:30");
        let fallback = scored(&FALLBACK, "2025/08/11 - 22:30");
        assert!(fallback < primary);

        let ambiguous = scored(&PRIMARY, "08/11/2025, 22:30");
        let unambiguous = scored(&PRIMARY, "25/08/2025, 22:30");
        assert_eq!(unambiguous - ambiguous, AMBIGUOUS_ORDER_PENALTY as u8);
    }

    #[test]
    fn test_unmatched_text_still_scored() {
        let signals = TextSignals::read("Some random text with no date");
        assert_eq!(score(&signals, None), (BASE - NO_YEAR_PENALTY) as u8);
    }

    #[test]
    fn test_score_clamped() {
        let signals = TextSignals { is_short: true, ..Default::default() };
        assert_eq!(score(&signals, None), (BASE - NO_YEAR_PENALTY - SHORT_TEXT_PENALTY) as u8);
    }
}
