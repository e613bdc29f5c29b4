//! Pattern-only entry extraction
//!
//! Used where markup cannot be parsed, and as the document-wide last resort
//! when the container cascade finds nothing. Watch links are found by regex.
//! Each link's channel and timestamp are searched in a window of at most
//! [`WINDOW_CHARS`] characters, never crossing a neighbouring watch link or
//! the start of an entry container.
//!
//! A timestamp found in the gap between two watch links belongs to the link
//! it sits nearer, counted in lines first and characters second. Whether
//! timestamps follow or precede their links is then settled by a vote over
//! every link, and each link only takes a timestamp it owns on that side, so
//! a missing timestamp is never borrowed from a neighbour.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::extractor::{
    ChunkExtraction, ENTRY_START_MARKER, EntryParts, ExtractionStrategy, Link, assemble,
    is_advertisement,
};
use super::links::{is_channel_url, is_watch_url};
use super::sanitize::{decode_entities, fold_meridiem, markup_lines, markup_to_text, sanitize_text};
use super::timestamp::{ExtractionStats, TimestampEngine};

/// Search distance on each side of a watch link
pub const WINDOW_CHARS: usize = 1500;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
        .expect("anchor regex compiles")
});

static BREAK_OR_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|<a\b").expect("break regex compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Unknown,
    TimestampAfter,
    TimestampBefore,
}

#[derive(Debug)]
struct Anchor {
    start: usize,
    end: usize,
    href: String,
    display: String,
}

impl Anchor {
    fn to_link(&self, text: &str) -> Link {
        let after = &text[self.end..];
        let stop = BREAK_OR_LINK.find(after).map_or(after.len(), |m| m.start());
        Link {
            href: self.href.clone(),
            display: self.display.clone(),
            trailing: markup_to_text(&after[..stop]),
        }
    }
}

fn anchors(text: &str) -> Vec<Anchor> {
    ANCHOR
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Anchor {
                start: whole.start(),
                end: whole.end(),
                href: decode_entities(caps.get(1)?.as_str().trim()).into_owned(),
                display: markup_to_text(caps.get(2).map_or("", |m| m.as_str())),
            })
        })
        .collect()
}

/// End of the forward window: [`WINDOW_CHARS`] characters after `from`, but
/// never past `limit`
fn forward_bound(text: &str, from: usize, limit: usize) -> usize {
    text[from..limit].char_indices().nth(WINDOW_CHARS).map_or(limit, |(i, _)| from + i)
}

/// Start of the backward window ending at `to`, never before `floor`
fn backward_bound(text: &str, floor: usize, to: usize) -> usize {
    text[floor..to].char_indices().rev().nth(WINDOW_CHARS - 1).map_or(floor, |(i, _)| floor + i)
}

/// Distance of a timestamp from each edge of its window as (lines, characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    from_start: (usize, usize),
    from_end: (usize, usize),
}

/// Sanitized text of one search window, with the visual line each part of it
/// came from
#[derive(Debug)]
struct Window {
    text: String,
    /// Byte offset in `text` and line number of every non-empty line
    starts: Vec<(usize, usize)>,
    lines: usize,
}

impl Window {
    fn new(markup: &str) -> Self {
        let raw_lines = markup_lines(markup);
        let mut text = String::new();
        let mut starts = Vec::new();
        for (number, raw) in raw_lines.iter().enumerate() {
            let line = fold_meridiem(&markup_to_text(raw)).into_owned();
            if line.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            starts.push((text.len(), number));
            text.push_str(&line);
        }
        Self { text, starts, lines: raw_lines.len() }
    }

    fn line_at(&self, offset: usize) -> usize {
        self.starts.iter().take_while(|(start, _)| *start <= offset).last().map_or(0, |&(_, n)| n)
    }

    /// Where the first timestamp-shaped text sits, if there is one
    fn place(&self, engine: &TimestampEngine) -> Option<Placement> {
        let found = engine.locate(&self.text, None).0?;
        let Some(start) = self.text.find(&found.text) else {
            // Rewritten during matching, so its position is unknown
            return Some(Placement { from_start: (0, 0), from_end: (0, 0) });
        };
        let end = start + found.text.len();
        let first = self.line_at(start);
        let last = self.line_at(end.saturating_sub(1));
        Some(Placement {
            from_start: (first, self.text[..start].trim_end().chars().count()),
            from_end: (
                self.lines.saturating_sub(last + 1),
                self.text[end..].trim_start().chars().count(),
            ),
        })
    }
}

/// Search windows on both sides of one watch link, and the timestamps the
/// link owns in each
#[derive(Debug)]
struct Surroundings {
    forward: Window,
    backward: Window,
    forward_end: usize,
    backward_start: usize,
    ahead: Option<Placement>,
    behind: Option<Placement>,
}

impl Surroundings {
    fn around(engine: &TimestampEngine, text: &str, watch: &[&Anchor], i: usize) -> Self {
        let link = watch[i];

        let next_start = watch.get(i + 1).map(|next| next.start);
        let mut limit = next_start.unwrap_or(text.len());
        let mut shares_ahead = next_start.is_some();
        if let Some(offset) = text[link.end..limit].find(ENTRY_START_MARKER) {
            limit = link.end + offset;
            shares_ahead = false;
        }
        let forward_end = forward_bound(text, link.end, limit);
        let shares_ahead = shares_ahead && forward_end == limit;

        let prev_end = i.checked_sub(1).map(|prev| watch[prev].end);
        let mut floor = prev_end.unwrap_or(0);
        let mut shares_behind = prev_end.is_some();
        if let Some(offset) = text[floor..link.start].rfind(ENTRY_START_MARKER) {
            floor += offset;
            shares_behind = false;
        }
        let backward_start = backward_bound(text, floor, link.start);
        let shares_behind = shares_behind && backward_start == floor;

        let forward = Window::new(&text[link.end..forward_end]);
        let backward = Window::new(&text[backward_start..link.start]);
        let ahead = forward
            .place(engine)
            .filter(|place| !shares_ahead || place.from_start <= place.from_end);
        let behind = backward
            .place(engine)
            .filter(|place| !shares_behind || place.from_end <= place.from_start);

        Self { forward, backward, forward_end, backward_start, ahead, behind }
    }

    /// Which side this link's own timestamp is on. A tie goes to the
    /// preceding side.
    fn vote(&self) -> Layout {
        match (self.ahead, self.behind) {
            (Some(ahead), Some(behind)) if behind.from_end <= ahead.from_start => {
                Layout::TimestampBefore
            }
            (Some(_), _) => Layout::TimestampAfter,
            (None, Some(_)) => Layout::TimestampBefore,
            (None, None) => Layout::Unknown,
        }
    }
}

/// Majority of the links' votes; an even split goes to the first link that voted
fn decide_layout(surroundings: &[Surroundings]) -> Layout {
    let votes: Vec<Layout> =
        surroundings.iter().map(Surroundings::vote).filter(|v| *v != Layout::Unknown).collect();
    let after = votes.iter().filter(|v| **v == Layout::TimestampAfter).count();
    let before = votes.len() - after;
    match after.cmp(&before) {
        Ordering::Greater => Layout::TimestampAfter,
        Ordering::Less => Layout::TimestampBefore,
        Ordering::Equal => votes.first().copied().unwrap_or(Layout::Unknown),
    }
}

/// Extract entries from raw text by patterns alone
pub fn extract(
    engine: &TimestampEngine,
    text: &str,
    stats: &mut ExtractionStats,
) -> ChunkExtraction {
    let all = anchors(text);
    let watch: Vec<&Anchor> = all.iter().filter(|a| is_watch_url(&a.href)).collect();

    let mut out = ChunkExtraction::default();
    if watch.is_empty() {
        return out;
    }
    out.strategy = Some(ExtractionStrategy::PatternOnly);

    let surroundings: Vec<Surroundings> =
        (0..watch.len()).map(|i| Surroundings::around(engine, text, &watch, i)).collect();
    let layout = decide_layout(&surroundings);
    if layout == Layout::TimestampBefore {
        debug!("Pattern extraction: timestamps precede their links");
    }
    let look_before = layout == Layout::TimestampBefore;

    for (link, around) in watch.iter().zip(&surroundings) {
        if is_advertisement(&around.forward.text)
            || (look_before && is_advertisement(&around.backward.text))
        {
            out.advertisements += 1;
            continue;
        }

        let timestamp = match layout {
            Layout::TimestampBefore if around.behind.is_some() => {
                engine.extract(&around.backward.text, None, stats)
            }
            Layout::TimestampAfter if around.ahead.is_some() => {
                engine.extract(&around.forward.text, None, stats)
            }
            _ => None,
        };

        let in_window = |anchor: &&Anchor| {
            let ahead = anchor.start >= link.end && anchor.end <= around.forward_end;
            let behind = look_before
                && anchor.start >= around.backward_start
                && anchor.end <= link.start;
            (ahead || behind) && is_channel_url(&anchor.href)
        };
        let mut links = vec![link.to_link(text)];
        links.extend(all.iter().filter(in_window).map(|anchor| anchor.to_link(text)));

        let entry_text = if look_before {
            sanitize_text(&format!("{} {}", around.backward.text, link.display))
        } else {
            sanitize_text(&format!("{} {}", link.display, around.forward.text))
        };
        let parts = EntryParts { text: entry_text, links, ..EntryParts::default() };

        match assemble(parts, timestamp) {
            Some(entry) => out.entries.push(entry),
            None => out.discarded += 1,
        }
    }
    out
}
