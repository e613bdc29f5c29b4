//! Text normalization shared by the extractor and the timestamp engine

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Space-like characters that exports use in dates and between words
const SPACE_VARIANTS: &[char] = &[
    '\u{00A0}', // no-break space
    '\u{1680}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}',
    '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}',
    '\u{202F}', // narrow no-break space, used before AM/PM
    '\u{205F}', '\u{3000}',
];

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

static MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d\s?|\b)([ap])\.?\s?m\b\.?").expect("meridiem regex compiles")
});

static LINE_BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex compiles"));

static BLOCK_END_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:div|p|li|tr|td|h[1-6])\s*>").expect("block end regex compiles")
});

static LINE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:div|p|li|tr|td|h[1-6])\s*>|\n").expect("line end regex compiles")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex compiles"));

/// Fold every space variant to ASCII space, drop zero-width characters and
/// collapse whitespace runs
pub fn sanitize_text(input: &str) -> String {
    let folded: String = input
        .chars()
        .filter(|c| !ZERO_WIDTH.contains(c))
        .map(|c| if SPACE_VARIANTS.contains(&c) { ' ' } else { c })
        .collect();
    collapse_whitespace(&folded)
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rewrite `a.m.`, `pm`, `P.M` and friends to `AM`/`PM`
pub fn fold_meridiem(input: &str) -> Cow<'_, str> {
    MERIDIEM.replace_all(input, |caps: &regex::Captures<'_>| {
        let marker = if caps[2].eq_ignore_ascii_case("a") { "AM" } else { "PM" };
        let lead = caps[1].trim_end();
        if lead.is_empty() { marker.to_string() } else { format!("{} {}", lead, marker) }
    })
}

/// Turn a markup fragment into sanitized text. Line breaks and block ends
/// become spaces so values split across `<br>` stay separated but adjacent.
pub fn markup_to_text(markup: &str) -> String {
    let with_breaks = LINE_BREAK_TAG.replace_all(markup, " ");
    let with_blocks = BLOCK_END_TAG.replace_all(&with_breaks, " ");
    let stripped = ANY_TAG.replace_all(&with_blocks, "");
    sanitize_text(&decode_entities(&stripped))
}

/// Raw markup of each `<br>`-separated line, in order
pub fn markup_segments(markup: &str) -> Vec<&str> {
    LINE_BREAK_TAG.split(markup).collect()
}

/// Raw markup of each visual line: split at line breaks, block ends and
/// newlines. Empty lines are kept so callers can count them.
pub fn markup_lines(markup: &str) -> Vec<&str> {
    LINE_END.split(markup).collect()
}

pub fn decode_entities(input: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(input)
}

/// Largest char boundary at or below `index`
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`
pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
