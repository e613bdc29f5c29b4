//! Adaptive chunking of one large export document.
//!
//! Chunk size follows tag density: dense markup gets small chunks so progress
//! is reported often, sparse markup gets large ones to cut per-chunk overhead.
//! Every cut is moved to an entry boundary where one can be found so no entry
//! is ever split across two chunks.

use std::ops::Range;

use crate::parsers::extractor::ENTRY_START_MARKER;
use crate::parsers::sanitize::{ceil_char_boundary, floor_char_boundary};

pub const MIN_CHUNK_BYTES: usize = 512 * 1024;
pub const MEDIUM_CHUNK_BYTES: usize = 1024 * 1024;
pub const MAX_CHUNK_BYTES: usize = 2 * 1024 * 1024;

/// Smallest chunk a caller hint can ask for
pub const MIN_HINT_BYTES: usize = 4 * 1024;

/// How far on either side of a cut to look for a clean boundary
pub const BOUNDARY_WINDOW: usize = 2000;

const DENSITY_SAMPLE_BYTES: usize = 64 * 1024;
const DENSE_TAGS_PER_KIB: f64 = 30.0;
const MEDIUM_TAGS_PER_KIB: f64 = 15.0;

/// Body container opening, used as the boundary when outer containers are absent
const BODY_CELL_MARKER: &str = r#"<div class="content-cell"#;

/// One contiguous slice of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    /// Byte offset of `text` within the document
    pub offset: usize,
    pub text: &'a str,
}

/// Markup elements per KiB, sampled from the start of the document
pub fn tag_density(document: &str) -> f64 {
    let end = floor_char_boundary(document, DENSITY_SAMPLE_BYTES);
    let sample = &document[..end];
    if sample.is_empty() {
        return 0.0;
    }
    let tags = sample.bytes().filter(|&b| b == b'<').count();
    tags as f64 / (sample.len() as f64 / 1024.0)
}

pub fn chunk_size_for(document: &str, hint: Option<usize>) -> usize {
    if let Some(hint) = hint {
        return hint.clamp(MIN_HINT_BYTES, MAX_CHUNK_BYTES);
    }
    let density = tag_density(document);
    if density >= DENSE_TAGS_PER_KIB {
        MIN_CHUNK_BYTES
    } else if density >= MEDIUM_TAGS_PER_KIB {
        MEDIUM_CHUNK_BYTES
    } else {
        MAX_CHUNK_BYTES
    }
}

/// The container opening that starts each entry in this document, if any
pub fn entry_marker(document: &str) -> Option<&'static str> {
    [ENTRY_START_MARKER, BODY_CELL_MARKER].into_iter().find(|marker| document.contains(marker))
}

/// Pick the end of the chunk starting at `start` whose naive end is `cut`.
///
/// In order: the next entry opening within the window after the cut, the
/// last one within the window before it, the end of the next closing tag,
/// and finally the cut itself. The result is always past `start`.
pub fn find_boundary(document: &str, start: usize, cut: usize, marker: Option<&str>) -> usize {
    let cut = floor_char_boundary(document, cut).max(ceil_char_boundary(document, start + 1));
    if cut >= document.len() {
        return document.len();
    }
    let ahead_end = floor_char_boundary(document, cut + BOUNDARY_WINDOW);
    let behind_start = ceil_char_boundary(document, cut.saturating_sub(BOUNDARY_WINDOW).max(start + 1));
    let ahead = &document[cut..ahead_end];

    if let Some(marker) = marker {
        if let Some(pos) = ahead.find(marker) {
            return cut + pos;
        }
        if behind_start < cut {
            if let Some(pos) = document[behind_start..cut].rfind(marker) {
                return behind_start + pos;
            }
        }
    }

    if let Some(close) = ahead.find("</") {
        if let Some(end) = ahead[close..].find('>') {
            return cut + close + end + 1;
        }
    }

    cut
}

/// Byte ranges of consecutive chunks covering the whole document
pub fn plan_chunks(document: &str, chunk_size: usize) -> Vec<Range<usize>> {
    let marker = entry_marker(document);
    let chunk_size = chunk_size.max(1);
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < document.len() {
        let end = find_boundary(document, start, start.saturating_add(chunk_size), marker);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

pub fn split(document: &str, hint: Option<usize>) -> Vec<Chunk<'_>> {
    plan_chunks(document, chunk_size_for(document, hint))
        .into_iter()
        .enumerate()
        .map(|(index, range)| Chunk { index, offset: range.start, text: &document[range] })
        .collect()
}

/// Offset of the last entry opening after the start of `buffer`; everything
/// before it holds only complete entries
pub fn last_entry_boundary(buffer: &str) -> Option<usize> {
    let marker = entry_marker(buffer)?;
    buffer.rfind(marker).filter(|&pos| pos > 0)
}
