//! Watch History Parser - Extract watch records from video watch-history exports
//!
//! This library turns the HTML activity export of a video platform into an
//! ordered sequence of normalized watch records. It supports:
//!
//! - Chunked parsing of large exports with progress reporting and cancellation
//! - Structured extraction with a pattern-only fallback for malformed markup
//! - Timestamp resolution across English and international date formats
//! - Running the pipeline on a worker thread or over a streaming reader
//! - Re-resolving stored records whose timestamp failed to parse
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use watch_history_parser::{ParseOptions, generate_summary, parse, read_document};
//!
//! let options = ParseOptions::default();
//! let document = read_document(Path::new("watch-history.html"), options.max_document_bytes)?;
//! let records = parse(&document, &options);
//! let summary = generate_summary(&records);
//! println!("Parsed {} records", summary.total_records);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::{ExtractionMode, ParseOptions};
pub use models::{ChunkProgress, ImportSummary, TimestampExtractionResult, WatchRecord};
pub use parsers::{ExtractionStats, TimestampEngine};
pub use pipeline::{
    MigrationReport, OffloadExecutor, OffloadHandle, ParseOutcome, StreamingParser,
    WorkerMessage, generate_summary, parse, parse_with_progress, reresolve_records,
};
pub use utils::read_document;
