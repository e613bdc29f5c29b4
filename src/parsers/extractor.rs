//! Entry Extractor
//!
//! Finds watch entries inside one chunk of markup and pulls out their raw
//! fields. Containers are discovered by a cascade where the first strategy
//! with hits wins for the chunk:
//!
//! 1. `content-cell` body containers
//! 2. outer containers (`outer-cell` / `mdl-cell`), outermost only
//! 3. the nearest enclosing block of every watch link
//!
//! Pure text-pattern extraction lives in [`super::fallback`].

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use super::fallback;
use super::links::{channel_ref, is_music_url, is_watch_url, looks_like_url, video_ref};
use super::sanitize::{markup_segments, markup_to_text, sanitize_text};
use super::timestamp::{ExtractionStats, TimestampEngine};
use crate::models::{Product, RawEntry, TimestampExtractionResult};

/// Caption phrase that marks a promoted entry rather than a watch
pub const ADVERTISEMENT_MARKER: &str = "From Google Ads";

/// Opening of the outermost container of one entry in an activity export
pub const ENTRY_START_MARKER: &str = r#"<div class="outer-cell"#;

/// Header or caption phrase of the music product
pub const MUSIC_MARKER: &str = "YouTube Music";

const BLOCK_ELEMENTS: &[&str] =
    &["div", "li", "p", "td", "tr", "section", "article", "blockquote", "dd"];

static CONTENT_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.content-cell").expect("content cell selector parses"));

static OUTER_CELL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.outer-cell, div.mdl-cell").expect("outer cell selector parses")
});

static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector parses"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    ContentCell,
    OuterCell,
    ReferenceScan,
    PatternOnly,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::ContentCell => "content_cell",
            ExtractionStrategy::OuterCell => "outer_cell",
            ExtractionStrategy::ReferenceScan => "reference_scan",
            ExtractionStrategy::PatternOnly => "pattern_only",
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kept entry and the timestamp resolution attempted for it, if any
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntry {
    pub entry: RawEntry,
    pub timestamp: Option<TimestampExtractionResult>,
}

/// Everything one extraction pass produced
#[derive(Debug, Default)]
pub struct ChunkExtraction {
    /// Kept entries in document order
    pub entries: Vec<ExtractedEntry>,
    pub strategy: Option<ExtractionStrategy>,
    /// Advertisement entries skipped before any timestamp work
    pub advertisements: usize,
    /// Entries with neither a video nor a timestamp
    pub discarded: usize,
}

impl ChunkExtraction {
    fn with_strategy(strategy: ExtractionStrategy) -> Self {
        Self { strategy: Some(strategy), ..Self::default() }
    }

    pub fn absorb(&mut self, other: ChunkExtraction) {
        self.entries.extend(other.entries);
        self.advertisements += other.advertisements;
        self.discarded += other.discarded;
        if self.strategy.is_none() {
            self.strategy = other.strategy;
        }
    }
}

/// One `<a href>` seen inside an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Link {
    pub href: String,
    pub display: String,
    /// Text right after the link, up to the next line break or link
    pub trailing: String,
}

/// Raw material for one entry, gathered by either extraction mode
#[derive(Debug, Default)]
pub(crate) struct EntryParts {
    pub text: String,
    pub markup: String,
    /// Surrounding header/caption text, checked for product markers
    pub context: String,
    pub links: Vec<Link>,
}

pub fn is_advertisement(text: &str) -> bool {
    text.contains(ADVERTISEMENT_MARKER)
}

pub struct EntryExtractor<'e> {
    engine: &'e TimestampEngine,
}

impl<'e> EntryExtractor<'e> {
    pub fn new(engine: &'e TimestampEngine) -> Self {
        Self { engine }
    }

    /// Parse a chunk as markup and extract its entries with the container cascade
    pub fn extract_chunk(&self, chunk: &str, stats: &mut ExtractionStats) -> ChunkExtraction {
        let html = Html::parse_fragment(chunk);

        let cells: Vec<ElementRef<'_>> =
            html.select(&CONTENT_CELL).filter(|cell| is_body_cell(*cell)).collect();
        if !cells.is_empty() {
            let mut out = ChunkExtraction::with_strategy(ExtractionStrategy::ContentCell);
            for cell in cells {
                let context = entry_context(cell);
                self.process(cell, context, &mut out, stats);
            }
            return out;
        }

        let outers = outermost(html.select(&OUTER_CELL).collect());
        if !outers.is_empty() {
            let mut out = ChunkExtraction::with_strategy(ExtractionStrategy::OuterCell);
            for outer in outers {
                self.process(outer, String::new(), &mut out, stats);
            }
            return out;
        }

        self.reference_scan(&html, stats)
    }

    /// Extract by text patterns alone, without parsing markup
    pub fn extract_patterns(&self, text: &str, stats: &mut ExtractionStats) -> ChunkExtraction {
        fallback::extract(self.engine, text, stats)
    }

    fn reference_scan(&self, html: &Html, stats: &mut ExtractionStats) -> ChunkExtraction {
        let mut seen = HashSet::new();
        let mut blocks = Vec::new();
        for link in html.select(&LINK) {
            if !link.value().attr("href").is_some_and(is_watch_url) {
                continue;
            }
            if let Some(block) = enclosing_block(link) {
                if seen.insert(block.id()) {
                    blocks.push(block);
                }
            }
        }

        let mut out = ChunkExtraction::default();
        if blocks.is_empty() {
            return out;
        }
        out.strategy = Some(ExtractionStrategy::ReferenceScan);

        for block in blocks {
            let watch_links = block
                .select(&LINK)
                .filter(|link| link.value().attr("href").is_some_and(is_watch_url))
                .count();
            if watch_links > 1 {
                // Several entries share one block; split them by pattern instead
                out.absorb(fallback::extract(self.engine, &block.html(), stats));
            } else {
                self.process(block, String::new(), &mut out, stats);
            }
        }
        out
    }

    fn process(
        &self,
        element: ElementRef<'_>,
        context: String,
        out: &mut ChunkExtraction,
        stats: &mut ExtractionStats,
    ) {
        let text = element_text(element);
        if is_advertisement(&text) || is_advertisement(&context) {
            out.advertisements += 1;
            return;
        }

        let markup = element.html();
        let links: Vec<Link> = element.select(&LINK).filter_map(link_of).collect();
        let has_video = links.iter().any(|link| video_ref(&link.href, &link.display).is_some());
        let timestamp = self.find_timestamp(&text, &markup, has_video, stats);

        match assemble(EntryParts { text, markup, context, links }, timestamp) {
            Some(entry) => out.entries.push(entry),
            None => out.discarded += 1,
        }
    }

    /// Pattern search first; if nothing is timestamp-shaped, the last line of
    /// a video entry is kept as raw text when it looks like it could be one.
    /// Without a video that line alone never makes an entry.
    fn find_timestamp(
        &self,
        text: &str,
        markup: &str,
        has_video: bool,
        stats: &mut ExtractionStats,
    ) -> Option<TimestampExtractionResult> {
        if let Some(result) = self.engine.extract(text, Some(markup), stats) {
            return Some(result);
        }
        if !has_video {
            return None;
        }
        unmatched_timestamp_line(markup).map(|line| self.engine.resolve(&line, stats))
    }
}

/// Build the entry from gathered parts. Returns `None` when the entry has
/// neither a video nor a timestamp.
pub(crate) fn assemble(
    parts: EntryParts,
    timestamp: Option<TimestampExtractionResult>,
) -> Option<ExtractedEntry> {
    let video = parts.links.iter().find_map(|link| {
        let mut video = video_ref(&link.href, &link.display)?;
        if video.title.is_none() {
            video.title = recover_title(&link.trailing);
        }
        Some(video)
    });
    let channel = parts.links.iter().find_map(|link| channel_ref(&link.href, &link.display));

    let is_music = parts.text.contains(MUSIC_MARKER)
        || parts.context.contains(MUSIC_MARKER)
        || video.as_ref().is_some_and(|v| is_music_url(&v.url));

    let entry = RawEntry {
        video,
        channel,
        raw_timestamp: timestamp.as_ref().map(|t| t.raw_text.clone()),
        product: if is_music { Product::Music } else { Product::Primary },
        is_advertisement: false,
        text: parts.text,
        markup: parts.markup,
    };

    entry.has_payload().then_some(ExtractedEntry { entry, timestamp })
}

fn recover_title(trailing: &str) -> Option<String> {
    let title = trailing.trim_matches(|c: char| c.is_whitespace() || c == '-' || c == '|');
    (!title.is_empty() && !looks_like_url(title)).then(|| title.to_string())
}

fn unmatched_timestamp_line(markup: &str) -> Option<String> {
    let last = markup_segments(markup)
        .into_iter()
        .rev()
        .map(|segment| (segment, markup_to_text(segment)))
        .find(|(_, text)| !text.is_empty())?;
    let (segment, text) = last;
    if segment.contains("<a") || looks_like_url(&text) || !text.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    Some(text)
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn element_text(element: ElementRef<'_>) -> String {
    sanitize_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// A content cell holding an entry body, not its caption or the empty
/// right-aligned column
fn is_body_cell(cell: ElementRef<'_>) -> bool {
    has_class(cell, "content-cell")
        && !has_class(cell, "mdl-typography--caption")
        && !has_class(cell, "mdl-typography--text-right")
        && cell.text().any(|t| !t.trim().is_empty())
}

/// Header and caption text around a body cell. Only used when the parent
/// wraps this single entry, so a flat layout cannot leak markers between
/// neighbours.
fn entry_context(cell: ElementRef<'_>) -> String {
    let Some(parent) = cell.parent().and_then(ElementRef::wrap) else {
        return String::new();
    };
    let bodies = parent.children().filter_map(ElementRef::wrap).filter(|c| is_body_cell(*c)).count();
    if bodies == 1 { element_text(parent) } else { String::new() }
}

/// Drop matches nested inside another match
fn outermost<'a>(elements: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    let ids: HashSet<_> = elements.iter().map(|e| e.id()).collect();
    elements
        .into_iter()
        .filter(|element| !element.ancestors().any(|ancestor| ids.contains(&ancestor.id())))
        .collect()
}

fn enclosing_block(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| BLOCK_ELEMENTS.contains(&element.value().name()))
        .or_else(|| link.parent().and_then(ElementRef::wrap))
}

fn link_of(anchor: ElementRef<'_>) -> Option<Link> {
    let href = anchor.value().attr("href")?;
    Some(Link {
        href: href.trim().to_string(),
        display: element_text(anchor),
        trailing: trailing_text(anchor),
    })
}

fn trailing_text(anchor: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for sibling in anchor.next_siblings() {
        match sibling.value() {
            Node::Text(text) => parts.push(text.text.to_string()),
            Node::Element(element) if matches!(element.name(), "br" | "a") => break,
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(sibling) {
                    parts.extend(element.text().map(str::to_string));
                }
            }
            _ => {}
        }
    }
    sanitize_text(&parts.join(" "))
}
