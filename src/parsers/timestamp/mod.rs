//! Timestamp resolution engine
//!
//! Resolves free-text timestamps from activity exports into UTC instants:
//!
//! 1. Sanitize whitespace variants and meridiem spellings
//! 2. Find a timestamp-shaped substring with the primary patterns, then the
//!    international ones (when enabled), then the loose fallback set
//! 3. Strip the timezone marker and run the parse cascade
//!    (manual components, chrono format table, generic token scan)
//! 4. Reject instants outside [2005, reference year + 1]
//! 5. Score confidence and apply the minimum-confidence gate
//!
//! Every call is independent. The engine holds only its configuration and
//! never caches anything from one input for use on the next; the caller's
//! [`ExtractionStats`] is written to but never consulted.

pub mod formats;
pub mod months;
pub mod patterns;
pub mod scoring;
pub mod stats;
pub mod timezones;

use std::time::Instant;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

use self::patterns::{FALLBACK, INTERNATIONAL, PRIMARY, PatternKind, PatternMatch, find_first};
use self::scoring::TextSignals;
pub use self::stats::ExtractionStats;
use crate::config::{DEFAULT_MIN_CONFIDENCE, ParseOptions};
use crate::models::{
    ExtractionMetrics, RejectReason, StrategyName, TimestampExtractionResult, TimestampQuality,
};
use crate::parsers::sanitize::{fold_meridiem, markup_to_text, sanitize_text};

/// Year the platform launched; nothing in an export can predate it
pub const EARLIEST_PLAUSIBLE_YEAR: i32 = 2005;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampEngine {
    min_confidence: u8,
    international_formats: bool,
    reference_year: i32,
}

impl TimestampEngine {
    pub fn new(min_confidence: u8, international_formats: bool, reference_year: i32) -> Self {
        Self { min_confidence: min_confidence.min(100), international_formats, reference_year }
    }

    pub fn from_options(options: &ParseOptions) -> Self {
        Self::new(options.min_confidence, options.international_formats, options.reference_year())
    }

    /// Latest year accepted by the reasonableness check
    pub fn latest_plausible_year(&self) -> i32 {
        self.reference_year + 1
    }

    pub fn is_reasonable(&self, instant: &DateTime<Utc>) -> bool {
        (EARLIEST_PLAUSIBLE_YEAR..=self.latest_plausible_year()).contains(&instant.year())
    }

    /// Find the first timestamp-shaped substring in sanitized text, trying the
    /// markup-derived text alongside it. Returns the match and the number of
    /// pattern attempts made.
    pub fn locate(&self, plain: &str, markup: Option<&str>) -> (Option<PatternMatch>, u32) {
        let plain = fold_meridiem(&sanitize_text(plain)).into_owned();
        let from_markup = markup.map(|m| fold_meridiem(&markup_to_text(m)).into_owned());

        let mut texts = vec![plain.as_str()];
        if let Some(text) = from_markup.as_deref() {
            if text != plain {
                texts.push(text);
            }
        }

        let mut attempts = 0;
        let mut sets: Vec<&[patterns::PatternDef]> = vec![PRIMARY.as_slice()];
        if self.international_formats {
            sets.push(INTERNATIONAL.as_slice());
        }
        sets.push(FALLBACK.as_slice());

        for set in sets {
            let (found, tried) = find_first(set, texts.iter().copied());
            attempts += tried;
            if found.is_some() {
                return (found, attempts);
            }
        }
        (None, attempts)
    }

    /// Locate and resolve the timestamp inside one entry. Returns `None` when
    /// no timestamp-shaped text exists at all; the raw text of the result is
    /// the matched substring.
    pub fn extract(
        &self,
        plain: &str,
        markup: Option<&str>,
        stats: &mut ExtractionStats,
    ) -> Option<TimestampExtractionResult> {
        let started = Instant::now();
        let (found, attempts) = self.locate(plain, markup);
        let found = found?;
        let raw_text = found.text.clone();
        Some(self.resolve_match(raw_text, found, attempts, started, stats))
    }

    /// Resolve a raw timestamp text as stored. The raw text is kept verbatim
    /// in the result whether or not it resolves.
    pub fn resolve(&self, raw: &str, stats: &mut ExtractionStats) -> TimestampExtractionResult {
        let started = Instant::now();
        let (found, attempts) = self.locate(raw, None);
        match found {
            Some(found) => self.resolve_match(raw.to_string(), found, attempts, started, stats),
            None => {
                let sanitized = fold_meridiem(&sanitize_text(raw)).into_owned();
                let signals = TextSignals::read(&sanitized);
                let result = TimestampExtractionResult {
                    instant: None,
                    raw_text: raw.to_string(),
                    strategy: None,
                    confidence: scoring::score(&signals, None),
                    quality: TimestampQuality {
                        has_timezone: signals.has_timezone,
                        has_full_time: signals.has_seconds,
                        format_recognized: false,
                        date_in_reasonable_range: false,
                    },
                    metrics: ExtractionMetrics {
                        elapsed: started.elapsed(),
                        attempts,
                        used_fallback: false,
                    },
                    rejected: Some(RejectReason::NoPatternMatched),
                };
                stats.record(&result);
                result
            }
        }
    }

    fn resolve_match(
        &self,
        raw_text: String,
        found: PatternMatch,
        mut attempts: u32,
        started: Instant,
        stats: &mut ExtractionStats,
    ) -> TimestampExtractionResult {
        let (bare, zone) = timezones::strip(&found.text);

        let mut parsed = None;
        for (method, parser) in formats::CASCADE {
            attempts += 1;
            if let Some(naive) = parser(&bare) {
                parsed = Some((*method, naive));
                break;
            }
        }

        let instant = parsed.and_then(|(_, naive)| to_utc(naive, zone.as_ref()));
        let reasonable = instant.as_ref().is_some_and(|i| self.is_reasonable(i));

        let signals = TextSignals::read(&found.text);
        let confidence = scoring::score(&signals, Some(&found));

        let rejected = match instant {
            None => Some(RejectReason::Unparseable),
            Some(_) if !reasonable => Some(RejectReason::OutOfRange),
            Some(_) if confidence < self.min_confidence => Some(RejectReason::LowConfidence),
            Some(_) => None,
        };
        let accepted = rejected.is_none();

        let result = TimestampExtractionResult {
            instant: if accepted { instant } else { None },
            raw_text,
            strategy: match parsed {
                Some((method, _)) if accepted => {
                    Some(StrategyName { pattern: found.pattern.to_string(), method })
                }
                _ => None,
            },
            confidence,
            quality: TimestampQuality {
                has_timezone: zone.is_some(),
                has_full_time: signals.has_seconds,
                format_recognized: found.kind == PatternKind::Primary && found.named_month,
                date_in_reasonable_range: reasonable,
            },
            metrics: ExtractionMetrics {
                elapsed: started.elapsed(),
                attempts,
                used_fallback: found.is_fallback(),
            },
            rejected,
        };
        stats.record(&result);
        result
    }
}

impl Default for TimestampEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE, true, Utc::now().year())
    }
}

fn to_utc(naive: NaiveDateTime, zone: Option<&timezones::ZoneHit>) -> Option<DateTime<Utc>> {
    match zone {
        Some(hit) => naive.and_local_timezone(hit.offset).single().map(|dt| dt.with_timezone(&Utc)),
        None => Some(naive.and_utc()),
    }
}
