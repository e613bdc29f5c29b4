//! Data models for parsed watch history.
//!
//! - [`RawEntry`] - one candidate entry as found in a chunk of the export
//! - [`TimestampExtractionResult`] - outcome of resolving one raw timestamp text
//! - [`WatchRecord`] - canonical record handed to storage and aggregation
//! - [`ChunkProgress`] - progress snapshot reported between chunks
//! - [`ImportSummary`] - diagnostics folded from a record sequence

pub mod entry;
pub mod progress;
pub mod record;
pub mod summary;
pub mod timestamp;

pub use entry::{ChannelRef, Product, RawEntry, VideoRef};
pub use progress::ChunkProgress;
pub use record::{CalendarFields, WatchRecord};
pub use summary::{ImportSummary, ProductMix, QualityBreakdown};
pub use timestamp::{
    ExtractionMetrics, ParseMethod, RejectReason, StrategyName, TimestampExtractionResult,
    TimestampQuality,
};
