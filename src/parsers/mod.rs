//! Parsers for activity-export markup and the timestamps inside it
//!
//! # Error Handling Strategy
//!
//! Extraction follows a **graceful degradation** approach:
//!
//! - **Individual entry failures**: An entry with neither a video link nor a
//!   timestamp is discarded and counted. An entry with either one is kept, with
//!   the missing fields left empty rather than invented.
//!
//! - **Timestamp failures**: A timestamp that cannot be resolved, resolves to an
//!   implausible year, or scores below the confidence gate yields a result with
//!   no instant. The raw text is kept so it can be resolved again later.
//!
//! - **Structural mismatches**: When no container strategy finds anything, the
//!   pattern-only extractor runs over the raw text instead.
//!
//! Nothing in this module returns an error to the caller. Failures are visible
//! in the counters of [`ExtractionStats`] and [`extractor::ChunkExtraction`].

pub mod extractor;
pub mod fallback;
pub mod links;
pub mod sanitize;
pub mod timestamp;

pub use extractor::{ChunkExtraction, EntryExtractor, ExtractedEntry, ExtractionStrategy};
pub use timestamp::{ExtractionStats, TimestampEngine};
