use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which stage of the parse cascade produced the instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMethod {
    Manual,
    FormatTable,
    Generic,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::Manual => "manual",
            ParseMethod::FormatTable => "format_table",
            ParseMethod::Generic => "generic",
        }
    }
}

/// Name of the pattern that matched plus the parser that resolved it,
/// rendered as `pattern/method` (for example `named_month_full/manual`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrategyName {
    pub pattern: String,
    pub method: ParseMethod,
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pattern, self.method.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimestampQuality {
    pub has_timezone: bool,
    pub has_full_time: bool,
    pub format_recognized: bool,
    pub date_in_reasonable_range: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    pub elapsed: Duration,
    pub attempts: u32,
    pub used_fallback: bool,
}

/// Why a resolution attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NoPatternMatched,
    Unparseable,
    OutOfRange,
    LowConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampExtractionResult {
    pub instant: Option<DateTime<Utc>>,
    pub raw_text: String,
    pub strategy: Option<StrategyName>,
    pub confidence: u8,
    pub quality: TimestampQuality,
    pub metrics: ExtractionMetrics,
    pub rejected: Option<RejectReason>,
}

impl TimestampExtractionResult {
    pub fn is_resolved(&self) -> bool {
        self.instant.is_some()
    }
}
