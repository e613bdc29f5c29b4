use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMix {
    pub primary: usize,
    pub music: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub with_timezone: usize,
    pub with_full_time: usize,
    pub recognized_format: usize,
    pub reasonable_date: usize,
}

/// Import diagnostics folded from a record sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_records: usize,
    pub with_timestamp: usize,
    pub without_timestamp: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub products: ProductMix,
    pub distinct_videos: usize,
    pub distinct_channels: usize,
    /// Share of records with a raw timestamp that resolved, in [0, 1]
    pub timestamp_success_rate: f64,
    pub average_confidence: Option<f64>,
    pub strategy_usage: BTreeMap<String, usize>,
    pub quality: QualityBreakdown,
    pub records_per_year: BTreeMap<i32, usize>,
}
