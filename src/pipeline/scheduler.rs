//! Chunk scheduler
//!
//! Drives one document through chunking, extraction and normalization on the
//! calling thread. Chunks run strictly in order. Between chunks the scheduler
//! may yield the thread, report progress and check for cancellation; nothing
//! is ever suspended mid-chunk.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::chunker;
use super::normalizer::normalize;
use crate::config::{ExtractionMode, ParseOptions};
use crate::models::{ChunkProgress, WatchRecord};
use crate::parsers::{EntryExtractor, ExtractionStats, ExtractionStrategy, TimestampEngine};

/// Decides after each chunk whether to hand the thread back before the next
pub trait YieldPolicy {
    fn should_yield(&mut self, chunk_elapsed: Duration) -> bool;
}

/// Yield once a chunk took longer than one display frame
#[derive(Debug, Clone, Copy)]
pub struct FrameBudget {
    threshold: Duration,
}

impl FrameBudget {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }
}

impl YieldPolicy for FrameBudget {
    fn should_yield(&mut self, chunk_elapsed: Duration) -> bool {
        chunk_elapsed > self.threshold
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysYield;

impl YieldPolicy for AlwaysYield {
    fn should_yield(&mut self, _: Duration) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverYield;

impl YieldPolicy for NeverYield {
    fn should_yield(&mut self, _: Duration) -> bool {
        false
    }
}

/// Records and counters from one extraction pass
#[derive(Debug, Default)]
pub struct ChunkRecords {
    pub records: Vec<WatchRecord>,
    pub strategy: Option<ExtractionStrategy>,
    pub advertisements: usize,
    pub discarded: usize,
    /// Entries the normalizer refused
    pub dropped: usize,
}

/// Extract and normalize one piece of text
pub fn extract_records(
    extractor: &EntryExtractor<'_>,
    mode: ExtractionMode,
    text: &str,
    stats: &mut ExtractionStats,
) -> ChunkRecords {
    let extraction = match mode {
        ExtractionMode::Structured => extractor.extract_chunk(text, stats),
        ExtractionMode::PatternOnly => extractor.extract_patterns(text, stats),
    };

    let mut batch = ChunkRecords {
        strategy: extraction.strategy,
        advertisements: extraction.advertisements,
        discarded: extraction.discarded,
        ..ChunkRecords::default()
    };
    for entry in extraction.entries {
        match normalize(entry) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!("Dropping entry during normalization: {}", e);
                batch.dropped += 1;
            }
        }
    }
    batch
}

/// Everything a parse produced, records plus diagnostics
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Records in document order
    pub records: Vec<WatchRecord>,
    pub stats: ExtractionStats,
    pub chunks: usize,
    /// Chunks handled by each extraction strategy
    pub strategies: BTreeMap<String, usize>,
    pub advertisements: usize,
    pub discarded: usize,
    pub dropped: usize,
    pub faulted_chunks: usize,
    pub yields: usize,
    pub cancelled: bool,
    pub used_document_fallback: bool,
    pub elapsed: Duration,
}

impl ParseOutcome {
    pub fn absorb(&mut self, batch: ChunkRecords) {
        self.records.extend(batch.records);
        if let Some(strategy) = batch.strategy {
            *self.strategies.entry(strategy.to_string()).or_insert(0) += 1;
        }
        self.advertisements += batch.advertisements;
        self.discarded += batch.discarded;
        self.dropped += batch.dropped;
    }
}

pub struct Scheduler<'h> {
    options: ParseOptions,
    engine: TimestampEngine,
    progress: Option<Box<dyn FnMut(&ChunkProgress) + 'h>>,
    cancel: Option<Box<dyn Fn() -> bool + 'h>>,
    inspect: Option<Box<dyn FnMut(usize, &str) + 'h>>,
    yield_policy: Box<dyn YieldPolicy + 'h>,
}

impl<'h> Scheduler<'h> {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            engine: TimestampEngine::from_options(options),
            yield_policy: Box::new(FrameBudget::new(options.yield_threshold)),
            options: options.clone(),
            progress: None,
            cancel: None,
            inspect: None,
        }
    }

    pub fn on_progress(mut self, report: impl FnMut(&ChunkProgress) + 'h) -> Self {
        self.progress = Some(Box::new(report));
        self
    }

    /// Checked at the start of every chunk; `true` stops the parse with
    /// whatever has been collected so far
    pub fn cancel_when(mut self, should_cancel: impl Fn() -> bool + 'h) -> Self {
        self.cancel = Some(Box::new(should_cancel));
        self
    }

    /// Runs inside the chunk guard just before extraction, with the chunk
    /// index and text. A panic here faults that chunk only.
    pub fn inspect_chunks(mut self, inspect: impl FnMut(usize, &str) + 'h) -> Self {
        self.inspect = Some(Box::new(inspect));
        self
    }

    pub fn yield_policy(mut self, policy: impl YieldPolicy + 'h) -> Self {
        self.yield_policy = Box::new(policy);
        self
    }

    pub fn run(self, document: &str) -> ParseOutcome {
        let Scheduler { options, engine, mut progress, cancel, mut inspect, mut yield_policy } = self;
        let started = Instant::now();
        let extractor = EntryExtractor::new(&engine);
        let mut outcome = ParseOutcome::default();

        let chunks = chunker::split(document, options.chunk_size_hint);
        let total = chunks.len();
        debug!("Parsing {} bytes in {} chunks", document.len(), total);

        for chunk in &chunks {
            if cancel.as_ref().is_some_and(|should_cancel| should_cancel()) {
                info!("Parse cancelled before chunk {} of {}", chunk.index + 1, total);
                outcome.cancelled = true;
                break;
            }

            let chunk_started = Instant::now();
            let stats = &mut outcome.stats;
            let inspect = &mut inspect;
            let batch = run_guarded(chunk.index, || {
                if let Some(inspect) = inspect.as_mut() {
                    inspect(chunk.index, chunk.text);
                }
                extract_records(&extractor, options.extraction_mode, chunk.text, stats)
            });
            match batch {
                Some(batch) => outcome.absorb(batch),
                None => outcome.faulted_chunks += 1,
            }
            outcome.chunks += 1;

            let done = chunk.index + 1;
            let is_final = done == total;
            let over_budget = yield_policy.should_yield(chunk_started.elapsed());
            if over_budget || is_final {
                if let Some(report) = progress.as_mut() {
                    report(&progress_at(done, total, outcome.records.len(), started.elapsed()));
                }
            }
            if over_budget && !is_final {
                outcome.yields += 1;
                thread::yield_now();
            }
        }

        let structure_missed = outcome.records.is_empty() && outcome.advertisements == 0;
        if structure_missed
            && !outcome.cancelled
            && options.extraction_mode == ExtractionMode::Structured
            && !document.trim().is_empty()
        {
            warn!("No entries found in document structure; falling back to pattern extraction");
            let stats = &mut outcome.stats;
            let batch = run_guarded(total, || {
                extract_records(&extractor, ExtractionMode::PatternOnly, document, stats)
            });
            if let Some(batch) = batch {
                // The pattern pass re-examines every entry
                outcome.discarded = 0;
                outcome.absorb(batch);
            }
            outcome.used_document_fallback = true;
        }

        outcome.elapsed = started.elapsed();
        info!(
            "Parsed {} records from {} chunks ({} advertisements, {} discarded, {} faulted chunks)",
            outcome.records.len(),
            outcome.chunks,
            outcome.advertisements,
            outcome.discarded,
            outcome.faulted_chunks
        );
        outcome
    }
}

fn progress_at(done: usize, total: usize, records: usize, elapsed: Duration) -> ChunkProgress {
    let remaining = total.saturating_sub(done);
    ChunkProgress {
        processed_records: records,
        total_chunks: total,
        percentage: if total == 0 { 100.0 } else { done as f64 / total as f64 * 100.0 },
        eta: (done > 0).then(|| elapsed.mul_f64(remaining as f64 / done as f64)),
        current_chunk: done,
    }
}

/// Run one unit of work, turning a panic into a logged skip
pub(crate) fn run_guarded<T>(index: usize, work: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(value) => Some(value),
        Err(panic) => {
            warn!("Chunk {} faulted and was skipped: {}", index + 1, panic_message(panic.as_ref()));
            None
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
