//! Timezone markers recognised in export timestamps.
//!
//! Abbreviations map to fixed offsets. Exports print the abbreviation that was
//! in effect at the time of the event, so daylight-saving variants have their
//! own entries and no zone rules are needed.

use std::sync::LazyLock;

use chrono::FixedOffset;
use regex::Regex;

const HOUR: i32 = 3600;

/// (abbreviation, offset east of UTC in seconds)
const ABBREVIATIONS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("UT", 0),
    ("Z", 0),
    // North America
    ("HST", -10 * HOUR),
    ("AKST", -9 * HOUR),
    ("AKDT", -8 * HOUR),
    ("PST", -8 * HOUR),
    ("PDT", -7 * HOUR),
    ("MST", -7 * HOUR),
    ("MDT", -6 * HOUR),
    ("CST", -6 * HOUR),
    ("CDT", -5 * HOUR),
    ("EST", -5 * HOUR),
    ("EDT", -4 * HOUR),
    ("AST", -4 * HOUR),
    ("ADT", -3 * HOUR),
    ("NST", -(3 * HOUR + 1800)),
    ("NDT", -(2 * HOUR + 1800)),
    // Europe
    ("WET", 0),
    ("WEST", HOUR),
    ("BST", HOUR),
    ("CET", HOUR),
    ("MEZ", HOUR),
    ("CEST", 2 * HOUR),
    ("MESZ", 2 * HOUR),
    ("EET", 2 * HOUR),
    ("EEST", 3 * HOUR),
    ("MSK", 3 * HOUR),
    // Asia / Pacific
    ("IST", 5 * HOUR + 1800),
    ("SGT", 8 * HOUR),
    ("HKT", 8 * HOUR),
    ("AWST", 8 * HOUR),
    ("JST", 9 * HOUR),
    ("KST", 9 * HOUR),
    ("ACST", 9 * HOUR + 1800),
    ("AEST", 10 * HOUR),
    ("AEDT", 11 * HOUR),
    ("NZST", 12 * HOUR),
    ("NZDT", 13 * HOUR),
];

static NUMERIC_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:GMT|UTC)?\s?([+-])(\d{1,2})(?::?(\d{2}))?$").expect("offset regex compiles")
});

/// Any token that could be a timezone marker: an abbreviation, a GMT/UTC
/// offset, or a bare numeric offset directly after a time.
static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:GMT|UTC)\s?[+-]\d{1,2}(?::?\d{2})?\b|\b[A-Z]{2,5}\b|(?:\d)(Z)\b|[+-]\d{2}:?\d{2}\b")
        .expect("timezone marker regex compiles")
});

/// A recognised timezone marker and where it sat in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneHit {
    pub label: String,
    pub offset: FixedOffset,
    pub start: usize,
    pub end: usize,
}

/// Resolve a single marker token to its offset
pub fn lookup(token: &str) -> Option<FixedOffset> {
    let token = token.trim();
    if let Some((_, seconds)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == token) {
        return FixedOffset::east_opt(*seconds);
    }

    let caps = NUMERIC_OFFSET.captures(token)?;
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    let seconds = hours * HOUR + minutes * 60;
    FixedOffset::east_opt(if &caps[1] == "-" { -seconds } else { seconds })
}

/// Find the first recognised timezone marker in `text`
pub fn find(text: &str) -> Option<ZoneHit> {
    for caps in MARKER.captures_iter(text) {
        // `\dZ` captures the digit too; only the `Z` is the marker
        let m = caps.get(1).or_else(|| caps.get(0))?;
        if let Some(offset) = lookup(m.as_str()) {
            return Some(ZoneHit {
                label: m.as_str().to_string(),
                offset,
                start: m.start(),
                end: m.end(),
            });
        }
    }
    None
}

/// Remove the first recognised marker so format parsers see a bare local time
pub fn strip(text: &str) -> (String, Option<ZoneHit>) {
    match find(text) {
        Some(hit) => {
            let mut stripped = String::with_capacity(text.len());
            stripped.push_str(text[..hit.start].trim_end());
            let rest = text[hit.end..].trim_start();
            if !rest.is_empty() {
                stripped.push(' ');
                stripped.push_str(rest);
            }
            (stripped, Some(hit))
        }
        None => (text.to_string(), None),
    }
}
