use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::Product;
use super::timestamp::TimestampQuality;

/// Calendar fields derived from a resolved instant (UTC).
///
/// Kept as one optional block on [`WatchRecord`] so the fields can only be
/// present or absent together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    pub year: i32,
    pub month: u32,
    pub iso_week: u32,
    /// 0 = Sunday
    pub day_of_week: u32,
    pub hour: u32,
    /// `YYYY-MM`, used for year-over-year joins
    pub year_month: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRecord {
    pub id: String,
    pub watched_at: Option<DateTime<Utc>>,
    pub video_id: Option<String>,
    pub video_title: Option<String>,
    pub video_url: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub channel_url: Option<String>,
    pub product: Product,
    #[serde(default)]
    pub calendar: Option<CalendarFields>,
    /// Timestamp text exactly as observed in the source, kept for re-extraction
    pub raw_timestamp: Option<String>,
    #[serde(default)]
    pub timestamp_confidence: Option<u8>,
    #[serde(default)]
    pub timestamp_strategy: Option<String>,
    #[serde(default)]
    pub timestamp_quality: Option<TimestampQuality>,
}

impl WatchRecord {
    /// Identity without the uniqueness suffix
    pub fn content_key(&self) -> &str {
        self.id.split_once('-').map(|(key, _)| key).unwrap_or(&self.id)
    }

    pub fn needs_reresolution(&self) -> bool {
        self.watched_at.is_none() && self.raw_timestamp.is_some()
    }
}
