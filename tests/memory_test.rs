/// Memory and resource management tests
///
/// These tests exercise large inputs, repeated runs and worker cleanup
mod common;

use std::io::{self, Read};

use common::{ArchiveBuilder, EntryBuilder, archive_with_watches, test_options};
use watch_history_parser::pipeline::streaming::LOOKBACK_CAP_BYTES;
use watch_history_parser::{OffloadExecutor, StreamingParser, parse, read_document};

/// Reader that produces the same archive entry over and over without ever
/// holding the whole document in memory
struct RepeatingArchive {
    entry: Vec<u8>,
    remaining: usize,
    position: usize,
}

impl RepeatingArchive {
    fn new(entries: usize) -> Self {
        Self { entry: EntryBuilder::new().to_html().into_bytes(), remaining: entries, position: 0 }
    }
}

impl Read for RepeatingArchive {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let n = buf.len().min(self.entry.len() - self.position);
        buf[..n].copy_from_slice(&self.entry[self.position..self.position + n]);
        self.position += n;
        if self.position == self.entry.len() {
            self.position = 0;
            self.remaining -= 1;
        }
        Ok(n)
    }
}

#[test]
fn test_memory_repeated_parsing() {
    let document = archive_with_watches(20);

    for i in 0..200 {
        let records = parse(&document, &test_options());
        assert_eq!(records.len(), 20, "Iteration {} should yield every record", i);
    }
}

#[test]
fn test_memory_streaming_input_larger_than_lookback_cap() {
    // About 1.1 KiB per entry, so this is well past the look-back cap
    let entries = 15_000;
    let mut parser = StreamingParser::new(RepeatingArchive::new(entries), &test_options());

    let mut total = 0;
    let mut batches = 0;
    while let Some(batch) = parser.next_batch().unwrap() {
        total += batch.len();
        batches += 1;
    }

    assert!(EntryBuilder::new().to_html().len() * entries > LOOKBACK_CAP_BYTES);
    assert_eq!(total, entries);
    assert!(batches > 100);
    assert_eq!(parser.discarded_bytes(), 0, "Entry boundaries keep the buffer small");
}

#[test]
fn test_memory_document_near_size_limit() {
    let archive = ArchiveBuilder::new().with_watches(7_000);
    let (_dir, path) = archive.write();
    let options = test_options();

    let document = read_document(&path, options.max_document_bytes).unwrap();
    assert!(document.len() < options.max_document_bytes as usize);

    let records = parse(&document, &options);
    assert_eq!(records.len(), 7_000);
}

#[test]
fn test_memory_offload_workers_are_joined() {
    let document = archive_with_watches(30);

    for _ in 0..50 {
        let handle = OffloadExecutor::spawn(document.clone(), test_options()).unwrap();
        let (records, _) = handle.wait().unwrap();
        assert_eq!(records.len(), 30);
    }
}

#[test]
fn test_memory_dropped_handle_does_not_block() {
    let document = archive_with_watches(500);
    let handle = OffloadExecutor::spawn(document, test_options()).unwrap();
    handle.cancel();
    drop(handle);
}
