//! Ordered timestamp patterns.
//!
//! Each [`PatternDef`] is a pure `text -> Option<PatternMatch>` step. The
//! lists are tried in order and the first hit wins, so more specific
//! layouts come first.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::months::{ENGLISH_MONTH_PATTERN, english_month, month_from_name};
use super::timezones;

/// Optional trailing timezone marker; unknown tokens are trimmed off the match
const TZ: &str = r"(?:\s?(?P<tz>(?:GMT|UTC)\s?[+-]\d{1,2}(?::?\d{2})?|[A-Z]{2,5})\b)?";

const TIME: &str = r"(?P<hour>\d{1,2}):(?P<min>\d{2})(?::(?P<sec>\d{2}))?";

const NON_ENGLISH_CONNECTORS: &[&str] = &["à", "um", "a las", "às", "alle", "om", "kl."];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Primary,
    International,
    Fallback,
}

/// A timestamp-shaped substring and what its pattern says about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern: &'static str,
    pub kind: PatternKind,
    pub text: String,
    /// Month written as a name rather than a number
    pub named_month: bool,
    /// Numeric date where day and month could be swapped
    pub ambiguous_order: bool,
    /// Non-English month name, connector phrase, or CJK date markers
    pub localized: bool,
}

impl PatternMatch {
    pub fn is_fallback(&self) -> bool {
        self.kind == PatternKind::Fallback
    }

    /// The primary export layout: `Mon D, YYYY, H:MM:SS AM/PM`
    pub fn is_exact_primary(&self) -> bool {
        self.pattern == NAMED_MONTH_FULL
    }
}

pub const NAMED_MONTH_FULL: &str = "named_month_full";

pub struct PatternDef {
    pub name: &'static str,
    pub kind: PatternKind,
    regex: Regex,
    validate: fn(&Captures<'_>) -> bool,
}

impl PatternDef {
    fn new(name: &'static str, kind: PatternKind, pattern: &str) -> Self {
        Self::validated(name, kind, pattern, |_| true)
    }

    fn validated(
        name: &'static str,
        kind: PatternKind,
        pattern: &str,
        validate: fn(&Captures<'_>) -> bool,
    ) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("timestamp pattern {} does not compile: {}", name, e));
        Self { name, kind, regex, validate }
    }

    /// First valid occurrence of this pattern in `text`
    pub fn find(&self, text: &str) -> Option<PatternMatch> {
        let caps = self.regex.captures_iter(text).find(|caps| (self.validate)(caps))?;
        let whole = caps.get(0)?;

        let mut end = whole.end();
        if let Some(tz) = caps.name("tz") {
            if timezones::lookup(tz.as_str()).is_none() {
                end = tz.start();
            }
        }
        let matched = text[whole.start()..end].trim();

        let month_token = caps.name("mon").map(|m| m.as_str()).unwrap_or_default();
        let named_month = month_token.chars().any(char::is_alphabetic);
        let connector = caps.name("conn").map(|m| m.as_str());

        Some(PatternMatch {
            pattern: self.name,
            kind: self.kind,
            text: matched.to_string(),
            named_month,
            ambiguous_order: is_ambiguous_order(&caps),
            localized: (named_month && english_month(month_token).is_none())
                || connector.is_some_and(|c| NON_ENGLISH_CONNECTORS.contains(&c))
                || caps.name("cjk").is_some()
                || matched.contains(" de "),
        })
    }
}

fn is_ambiguous_order(caps: &Captures<'_>) -> bool {
    let (Some(first), Some(second)) = (caps.name("first"), caps.name("second")) else {
        return false;
    };
    match (first.as_str().parse::<u32>(), second.as_str().parse::<u32>()) {
        (Ok(a), Ok(b)) => a <= 12 && b <= 12 && a != b,
        _ => false,
    }
}

fn localized_month_is_known(caps: &Captures<'_>) -> bool {
    caps.name("mon").is_some_and(|m| month_from_name(m.as_str()).is_some())
}

fn with_month(template: &str) -> String {
    template
        .replace("{M}", ENGLISH_MONTH_PATTERN)
        .replace("{TIME}", TIME)
        .replace("{TZ}", TZ)
}

pub static PRIMARY: LazyLock<Vec<PatternDef>> = LazyLock::new(|| {
    vec![
        PatternDef::new(
            NAMED_MONTH_FULL,
            PatternKind::Primary,
            &with_month(
                r"\b(?P<mon>{M})\s(?P<day>\d{1,2}),?\s(?P<year>\d{4}),?\s(?P<hour>\d{1,2}):(?P<min>\d{2}):(?P<sec>\d{2})\s?(?P<mer>AM|PM){TZ}",
            ),
        ),
        PatternDef::new(
            "named_month_time",
            PatternKind::Primary,
            &with_month(
                r"\b(?P<mon>{M})\s(?P<day>\d{1,2}),?\s(?P<year>\d{4}),?\s(?:at\s)?{TIME}(?:\s?(?P<mer>AM|PM))?{TZ}",
            ),
        ),
        PatternDef::new(
            "day_month_year",
            PatternKind::Primary,
            &with_month(
                r"\b(?P<day>\d{1,2})\s(?P<mon>{M})\s(?P<year>\d{4}),?\s(?:at\s)?{TIME}(?:\s?(?P<mer>AM|PM))?{TZ}",
            ),
        ),
        PatternDef::new(
            "iso_8601",
            PatternKind::Primary,
            r"\b(?P<year>\d{4})-(?P<mon>\d{2})-(?P<day>\d{2})[T\s](?P<hour>\d{2}):(?P<min>\d{2})(?::(?P<sec>\d{2})(?:\.\d+)?)?(?:\s?(?P<tz>Z|[+-]\d{2}:?\d{2}|[A-Z]{2,5})\b)?",
        ),
        PatternDef::new(
            "numeric_slash",
            PatternKind::Primary,
            &with_month(
                r"\b(?P<first>\d{1,2})/(?P<second>\d{1,2})/(?P<year>\d{4}),?\s{TIME}(?:\s?(?P<mer>AM|PM))?{TZ}",
            ),
        ),
        PatternDef::new(
            "named_month_date",
            PatternKind::Primary,
            &with_month(r"\b(?P<mon>{M})\s(?P<day>\d{1,2}),\s(?P<year>\d{4})\b"),
        ),
    ]
});

pub static INTERNATIONAL: LazyLock<Vec<PatternDef>> = LazyLock::new(|| {
    vec![
        PatternDef::new(
            "european_dot",
            PatternKind::International,
            &with_month(
                r"\b(?P<day>\d{1,2})\.(?P<mon>\d{1,2})\.(?P<year>\d{4}),?\s(?:(?P<conn>um)\s)?{TIME}{TZ}",
            ),
        ),
        PatternDef::validated(
            "localized_named_month",
            PatternKind::International,
            &with_month(
                r"\b(?P<day>\d{1,2})\.?\s(?:de\s)?(?P<mon>\p{L}{3,10}\.?)\s(?:de\s)?(?P<year>\d{4}),?\s(?:(?P<conn>à|um|a las|às|alle|om|kl\.)\s)?(?P<hour>\d{1,2})[:h](?P<min>\d{2})(?::(?P<sec>\d{2}))?{TZ}",
            ),
            localized_month_is_known,
        ),
        PatternDef::new(
            "cjk_date",
            PatternKind::International,
            &with_month(
                r"(?P<year>\d{4})\s?(?P<cjk>[年년])\s?(?P<mon>\d{1,2})\s?[月월]\s?(?P<day>\d{1,2})\s?[日일]\s?(?:(?:午前|午後|上午|下午|오전|오후)\s?)?{TIME}{TZ}",
            ),
        ),
    ]
});

pub static FALLBACK: LazyLock<Vec<PatternDef>> = LazyLock::new(|| {
    vec![
        PatternDef::new(
            "year_first",
            PatternKind::Fallback,
            &with_month(
                r"\b(?P<year>\d{4})[-/.](?P<mon>\d{1,2})[-/.](?P<day>\d{1,2})\b(?:\D{1,3}{TIME})?{TZ}",
            ),
        ),
        PatternDef::new(
            "time_first",
            PatternKind::Fallback,
            &with_month(
                r"\b{TIME}\s?(?P<mer>AM|PM)?\D{1,12}?\b(?P<mon>{M})\w*\s+(?P<day>\d{1,2}),?\s+(?P<year>\d{4})",
            ),
        ),
        PatternDef::new(
            "month_name_first",
            PatternKind::Fallback,
            &with_month(
                r"\b(?P<mon>{M})\w*\s+(?P<day>\d{1,2})(?:st|nd|rd|th)?\W{1,4}(?P<year>\d{4})(?:\D{1,6}?{TIME}(?:\s?(?P<mer>AM|PM))?)?{TZ}",
            ),
        ),
        PatternDef::new(
            "year_any_time",
            PatternKind::Fallback,
            &with_month(
                r"\b(?P<year>(?:19|20)\d{2})\b.{0,40}?\b{TIME}(?:\s?(?P<mer>AM|PM))?{TZ}",
            ),
        ),
    ]
});

/// Try `patterns` in order against each text, returning the first hit and
/// how many pattern attempts it took
pub fn find_first<'a>(
    patterns: &[PatternDef],
    texts: impl IntoIterator<Item = &'a str> + Clone,
) -> (Option<PatternMatch>, u32) {
    let mut attempts = 0;
    for pattern in patterns {
        for text in texts.clone() {
            attempts += 1;
            if let Some(found) = pattern.find(text) {
                return (Some(found), attempts);
            }
        }
    }
    (None, attempts)
}
