//! Streaming-read mode
//!
//! Reads a document from any [`Read`] in fixed blocks and extracts entries as
//! soon as they are complete, keeping only the unfinished tail in a look-back
//! buffer. The buffer is capped: past [`LOOKBACK_CAP_BYTES`] the oldest
//! [`LOOKBACK_DISCARD_BYTES`] are thrown away, so recall is not guaranteed for
//! inputs with no entry boundaries over that distance.
//!
//! Entry markers inside an unclosed comment are not cut at. When no entry is
//! found anywhere, the text read so far (up to the same cap) gets one
//! pattern-only pass at end of input, as a whole-document parse would.

use std::io::{self, Read};
use std::str;

use tracing::{debug, warn};

use super::chunker::last_entry_boundary;
use super::scheduler::{ChunkRecords, extract_records, run_guarded};
use crate::config::{ExtractionMode, ParseOptions};
use crate::models::WatchRecord;
use crate::parsers::sanitize::ceil_char_boundary;
use crate::parsers::{EntryExtractor, ExtractionStats, TimestampEngine};

pub const READ_BLOCK_BYTES: usize = 64 * 1024;
pub const LOOKBACK_CAP_BYTES: usize = 10 * 1024 * 1024;
pub const LOOKBACK_DISCARD_BYTES: usize = 5 * 1024 * 1024;

pub struct StreamingParser<R> {
    reader: R,
    options: ParseOptions,
    engine: TimestampEngine,
    buffer: String,
    /// Bytes of a UTF-8 sequence split across two reads
    pending: Vec<u8>,
    stats: ExtractionStats,
    discarded_bytes: u64,
    advertisements: usize,
    batches: usize,
    finished: bool,
    /// Any record or advertisement seen so far
    found_entries: bool,
    /// Text that produced nothing, kept until an entry turns up
    retained: String,
    used_document_fallback: bool,
}

impl<R: Read> StreamingParser<R> {
    pub fn new(reader: R, options: &ParseOptions) -> Self {
        Self {
            reader,
            options: options.clone(),
            engine: TimestampEngine::from_options(options),
            buffer: String::new(),
            pending: Vec::new(),
            stats: ExtractionStats::new(),
            discarded_bytes: 0,
            advertisements: 0,
            batches: 0,
            finished: false,
            found_entries: false,
            retained: String::new(),
            used_document_fallback: false,
        }
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    /// Bytes thrown away by the look-back cap so far
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    pub fn advertisements(&self) -> usize {
        self.advertisements
    }

    /// Whether the end-of-input pattern pass ran
    pub fn used_document_fallback(&self) -> bool {
        self.used_document_fallback
    }

    /// Read one block and return the records of every entry it completed.
    /// Returns `Ok(None)` once the input is exhausted and flushed.
    pub fn next_batch(&mut self) -> io::Result<Option<Vec<WatchRecord>>> {
        if self.finished {
            return Ok(None);
        }

        let mut block = vec![0u8; READ_BLOCK_BYTES];
        let read = loop {
            match self.reader.read(&mut block) {
                Ok(read) => break read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if read == 0 {
            self.finished = true;
            if !self.pending.is_empty() {
                let tail = String::from_utf8_lossy(&self.pending).into_owned();
                self.buffer.push_str(&tail);
                self.pending.clear();
            }
            let rest = std::mem::take(&mut self.buffer);
            debug!("Stream finished; flushing {} buffered bytes", rest.len());
            let mut records = self.extract(&rest);
            records.extend(self.document_fallback());
            return Ok(Some(records));
        }

        self.append(&block[..read]);

        let records = match safe_boundary(&self.buffer) {
            Some(boundary) => {
                let complete: String = self.buffer.drain(..boundary).collect();
                self.extract(&complete)
            }
            None => Vec::new(),
        };

        if self.buffer.len() > LOOKBACK_CAP_BYTES {
            let cut = ceil_char_boundary(&self.buffer, LOOKBACK_DISCARD_BYTES);
            self.buffer.drain(..cut);
            self.discarded_bytes += cut as u64;
            warn!(
                "Look-back buffer exceeded {} bytes without an entry boundary; discarded {} bytes",
                LOOKBACK_CAP_BYTES, cut
            );
        }

        Ok(Some(records))
    }

    /// Read the whole input and return every record in order
    pub fn parse_all(&mut self) -> io::Result<Vec<WatchRecord>> {
        let mut records = Vec::new();
        while let Some(batch) = self.next_batch()? {
            records.extend(batch);
        }
        Ok(records)
    }

    fn append(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        match str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.pending.clear();
            }
            Err(e) if e.error_len().is_none() => {
                // Incomplete sequence at the end; keep it for the next read
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.buffer.push_str(&text);
                self.pending.drain(..valid);
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.buffer.push_str(&text);
                self.pending.clear();
            }
        }
    }

    fn extract(&mut self, text: &str) -> Vec<WatchRecord> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let mode = self.options.extraction_mode;
        let ChunkRecords { records, advertisements, .. } = self.run_batch(mode, text);
        self.advertisements += advertisements;

        if !records.is_empty() || advertisements > 0 {
            self.found_entries = true;
            self.retained = String::new();
        } else if !self.found_entries && mode == ExtractionMode::Structured {
            self.retain(text);
        }
        records
    }

    fn run_batch(&mut self, mode: ExtractionMode, text: &str) -> ChunkRecords {
        let extractor = EntryExtractor::new(&self.engine);
        let stats = &mut self.stats;
        let batch = run_guarded(self.batches, || extract_records(&extractor, mode, text, stats));
        self.batches += 1;
        batch.unwrap_or_default()
    }

    fn retain(&mut self, text: &str) {
        self.retained.push_str(text);
        if self.retained.len() > LOOKBACK_CAP_BYTES {
            let cut = ceil_char_boundary(&self.retained, LOOKBACK_DISCARD_BYTES);
            self.retained.drain(..cut);
            debug!("Dropped {} retained bytes kept for the pattern pass", cut);
        }
    }

    /// Pattern pass over the retained text when no entry was found anywhere
    fn document_fallback(&mut self) -> Vec<WatchRecord> {
        if self.found_entries || self.retained.trim().is_empty() {
            return Vec::new();
        }
        warn!("No entries found in streamed structure; falling back to pattern extraction");
        self.used_document_fallback = true;
        let retained = std::mem::take(&mut self.retained);
        let ChunkRecords { records, advertisements, .. } =
            self.run_batch(ExtractionMode::PatternOnly, &retained);
        self.advertisements += advertisements;
        records
    }
}

/// Last entry boundary that does not sit inside an unclosed comment. With
/// one open, the cut moves back to where the comment starts.
fn safe_boundary(buffer: &str) -> Option<usize> {
    let boundary = last_entry_boundary(buffer)?;
    let head = &buffer[..boundary];
    match head.rfind("<!--") {
        Some(open) if !head[open..].contains("-->") => (open > 0).then_some(open),
        _ => Some(boundary),
    }
}
