//! Re-resolution of stored records
//!
//! Records whose timestamp failed to resolve keep their raw text. After the
//! timestamp engine improves, running it again over those records recovers
//! instants without re-importing the source document.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::normalizer::apply_timestamp;
use crate::models::WatchRecord;
use crate::parsers::{ExtractionStats, TimestampEngine};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Records with raw text but no instant
    pub examined: usize,
    pub recovered: usize,
    pub still_unresolved: usize,
}

/// Run the timestamp engine again on every record that has raw text but no
/// instant. Identity, order and raw text are never changed.
pub fn reresolve_records(
    records: &mut [WatchRecord],
    engine: &TimestampEngine,
    stats: &mut ExtractionStats,
) -> MigrationReport {
    let mut report = MigrationReport::default();

    for record in records.iter_mut().filter(|r| r.needs_reresolution()) {
        let Some(raw) = record.raw_timestamp.as_deref() else {
            continue;
        };
        report.examined += 1;

        let result = engine.resolve(raw, stats);
        apply_timestamp(record, &result);
        if result.is_resolved() {
            report.recovered += 1;
        } else {
            report.still_unresolved += 1;
        }
    }

    info!(
        "Re-resolved {} of {} unresolved records",
        report.recovered, report.examined
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn stored(id: &str, raw: Option<&str>) -> WatchRecord {
        WatchRecord {
            id: id.to_string(),
            watched_at: None,
            video_id: Some("abcdefghijk".to_string()),
            video_title: Some("Title".to_string()),
            video_url: None,
            channel_id: None,
            channel_name: None,
            channel_url: None,
            product: Product::Primary,
            calendar: None,
            raw_timestamp: raw.map(str::to_string),
            timestamp_confidence: Some(10),
            timestamp_strategy: None,
            timestamp_quality: None,
        }
    }

    #[test]
    fn test_recovers_resolvable_records() {
        let engine = TimestampEngine::new(70, true, 2025);
        let mut stats = ExtractionStats::new();
        let mut records = vec![
            stored("a-1", Some("12 août 2024 à 14:05:09 UTC")),
            stored("b-2", Some("not a date")),
            stored("c-3", None),
        ];

        let report = reresolve_records(&mut records, &engine, &mut stats);

        assert_eq!(report, MigrationReport { examined: 2, recovered: 1, still_unresolved: 1 });
        assert!(records[0].watched_at.is_some());
        assert!(records[0].calendar.is_some());
        assert_eq!(records[0].raw_timestamp.as_deref(), Some("12 août 2024 à 14:05:09 UTC"));
        assert!(records[1].watched_at.is_none());
        assert!(records[1].calendar.is_none());
        assert_eq!(records[1].raw_timestamp.as_deref(), Some("not a date"));
        assert!(records[2].timestamp_quality.is_none());

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a-1", "b-2", "c-3"]);
        assert_eq!(stats.attempts, 2);
    }

    #[test]
    fn test_resolved_records_are_untouched() {
        let engine = TimestampEngine::new(70, true, 2025);
        let mut stats = ExtractionStats::new();
        let mut record = stored("a-1", Some("Aug 11, 2025, 10:30:00 PM CDT"));
        reresolve_records(std::slice::from_mut(&mut record), &engine, &mut stats);
        let before = record.clone();

        let report = reresolve_records(std::slice::from_mut(&mut record), &engine, &mut stats);
        assert_eq!(report.examined, 0);
        assert_eq!(record, before);
    }
}
