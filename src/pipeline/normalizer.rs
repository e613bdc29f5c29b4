//! Record Normalizer: one extracted entry in, one owned [`WatchRecord`] out

use chrono::{DateTime, Datelike, Timelike, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CalendarFields, TimestampExtractionResult, WatchRecord};
use crate::parsers::ExtractedEntry;

/// Hex characters of the content hash kept in an identity
const CONTENT_KEY_LEN: usize = 16;
const SUFFIX_LEN: usize = 8;

/// Field separator inside the hashed identity input
const UNIT_SEPARATOR: u8 = 0x1f;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Advertisement entries are never normalized")]
    Advertisement,

    #[error("Entry has neither a video reference nor a timestamp")]
    EmptyEntry,

    #[error("Timestamp result text {result:?} does not match the entry's raw text {entry:?}")]
    TimestampMismatch { entry: Option<String>, result: String },
}

/// Deterministic part of a record identity: hash of the video reference,
/// raw timestamp text and title
pub fn content_key(video: Option<&str>, raw_timestamp: Option<&str>, title: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    for field in [video, raw_timestamp, title] {
        hasher.update(field.unwrap_or_default().as_bytes());
        hasher.update([UNIT_SEPARATOR]);
    }
    let hex = format!("{:x}", hasher.finalize());
    hex[..CONTENT_KEY_LEN].to_string()
}

fn unique_suffix() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple[..SUFFIX_LEN].to_string()
}

/// Calendar fields of an instant, all in UTC
pub fn calendar_fields(instant: &DateTime<Utc>) -> CalendarFields {
    CalendarFields {
        year: instant.year(),
        month: instant.month(),
        iso_week: instant.iso_week().week(),
        day_of_week: instant.weekday().num_days_from_sunday(),
        hour: instant.hour(),
        year_month: format!("{:04}-{:02}", instant.year(), instant.month()),
    }
}

/// Write a resolution result onto a record. Calendar fields follow the
/// instant; the raw text is left as it is.
pub fn apply_timestamp(record: &mut WatchRecord, result: &TimestampExtractionResult) {
    record.watched_at = result.instant;
    record.calendar = result.instant.as_ref().map(calendar_fields);
    record.timestamp_confidence = Some(result.confidence);
    record.timestamp_strategy = result.strategy.as_ref().map(|s| s.to_string());
    record.timestamp_quality = Some(result.quality.clone());
}

pub fn normalize(extracted: ExtractedEntry) -> Result<WatchRecord, NormalizeError> {
    let ExtractedEntry { entry, timestamp } = extracted;
    if entry.is_advertisement {
        return Err(NormalizeError::Advertisement);
    }
    if !entry.has_payload() {
        return Err(NormalizeError::EmptyEntry);
    }
    if let Some(result) = &timestamp {
        if entry.raw_timestamp.as_deref() != Some(result.raw_text.as_str()) {
            return Err(NormalizeError::TimestampMismatch {
                entry: entry.raw_timestamp,
                result: result.raw_text.clone(),
            });
        }
    }

    let (video_id, video_title, video_url) = match entry.video {
        Some(video) => (video.id, video.title, Some(video.url)),
        None => (None, None, None),
    };
    let (channel_id, channel_name, channel_url) = match entry.channel {
        Some(channel) => (channel.id, channel.name, Some(channel.url)),
        None => (None, None, None),
    };

    let key = content_key(
        video_url.as_deref().or(video_id.as_deref()),
        entry.raw_timestamp.as_deref(),
        video_title.as_deref(),
    );

    let mut record = WatchRecord {
        id: format!("{}-{}", key, unique_suffix()),
        watched_at: None,
        video_id,
        video_title,
        video_url,
        channel_id,
        channel_name,
        channel_url,
        product: entry.product,
        calendar: None,
        raw_timestamp: entry.raw_timestamp,
        timestamp_confidence: None,
        timestamp_strategy: None,
        timestamp_quality: None,
    };
    if let Some(result) = &timestamp {
        apply_timestamp(&mut record, result);
    }
    Ok(record)
}
