//! Import summary over a finished record sequence

use std::collections::HashSet;

use crate::models::{ImportSummary, Product, WatchRecord};

/// Fold a record sequence into import diagnostics
pub fn generate_summary(records: &[WatchRecord]) -> ImportSummary {
    let mut summary = ImportSummary { total_records: records.len(), ..ImportSummary::default() };
    let mut videos = HashSet::new();
    let mut channels = HashSet::new();
    let mut with_raw_text = 0usize;
    let mut confidence_total = 0u64;
    let mut confidence_count = 0u64;

    for record in records {
        match record.product {
            Product::Primary => summary.products.primary += 1,
            Product::Music => summary.products.music += 1,
        }

        if let Some(video) = record.video_id.as_deref().or(record.video_url.as_deref()) {
            videos.insert(video);
        }
        if let Some(channel) = record
            .channel_id
            .as_deref()
            .or(record.channel_url.as_deref())
            .or(record.channel_name.as_deref())
        {
            channels.insert(channel);
        }

        if record.raw_timestamp.is_some() {
            with_raw_text += 1;
        }

        if let Some(quality) = &record.timestamp_quality {
            summary.quality.with_timezone += usize::from(quality.has_timezone);
            summary.quality.with_full_time += usize::from(quality.has_full_time);
            summary.quality.recognized_format += usize::from(quality.format_recognized);
            summary.quality.reasonable_date += usize::from(quality.date_in_reasonable_range);
        }

        let Some(watched_at) = record.watched_at else {
            summary.without_timestamp += 1;
            continue;
        };
        summary.with_timestamp += 1;
        summary.earliest = Some(summary.earliest.map_or(watched_at, |e| e.min(watched_at)));
        summary.latest = Some(summary.latest.map_or(watched_at, |l| l.max(watched_at)));

        if let Some(confidence) = record.timestamp_confidence {
            confidence_total += u64::from(confidence);
            confidence_count += 1;
        }
        if let Some(strategy) = &record.timestamp_strategy {
            *summary.strategy_usage.entry(strategy.clone()).or_insert(0) += 1;
        }
        if let Some(calendar) = &record.calendar {
            *summary.records_per_year.entry(calendar.year).or_insert(0) += 1;
        }
    }

    summary.distinct_videos = videos.len();
    summary.distinct_channels = channels.len();
    if with_raw_text > 0 {
        summary.timestamp_success_rate = summary.with_timestamp as f64 / with_raw_text as f64;
    }
    if confidence_count > 0 {
        summary.average_confidence = Some(confidence_total as f64 / confidence_count as f64);
    }
    summary
}
