//! Document pipeline: chunker, scheduler, normalizer and their adapters
//!
//! One pipeline implementation serves every entry point. [`parse`] runs it
//! on the calling thread, [`offload::OffloadExecutor`] runs it on a worker
//! thread and [`streaming::StreamingParser`] feeds it from a reader.

pub mod chunker;
pub mod migrate;
pub mod normalizer;
pub mod offload;
pub mod scheduler;
pub mod streaming;
pub mod summary;

pub use migrate::{MigrationReport, reresolve_records};
pub use normalizer::{NormalizeError, normalize};
pub use offload::{OffloadError, OffloadExecutor, OffloadHandle, WorkerMessage};
pub use scheduler::{AlwaysYield, FrameBudget, NeverYield, ParseOutcome, Scheduler, YieldPolicy};
pub use streaming::StreamingParser;
pub use summary::generate_summary;

use crate::config::ParseOptions;
use crate::models::{ChunkProgress, WatchRecord};

/// Parse a whole document into records, in document order. Never fails:
/// malformed input yields fewer records, at worst none.
pub fn parse(document: &str, options: &ParseOptions) -> Vec<WatchRecord> {
    Scheduler::new(options).run(document).records
}

/// [`parse`] with a progress callback and a cancellation predicate checked
/// before every chunk
pub fn parse_with_progress<'h>(
    document: &str,
    options: &ParseOptions,
    on_progress: impl FnMut(&ChunkProgress) + 'h,
    should_cancel: impl Fn() -> bool + 'h,
) -> ParseOutcome {
    Scheduler::new(options).on_progress(on_progress).cancel_when(should_cancel).run(document)
}
