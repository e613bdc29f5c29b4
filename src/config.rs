//! Parse options
//!
//! Options are layered: built-in defaults, then an optional JSON file, then
//! `WATCH_PARSER_*` environment variables. The CLI applies its own flags last.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minimum confidence a resolved timestamp needs to be accepted
pub const DEFAULT_MIN_CONFIDENCE: u8 = 70;

/// One display frame at 60 Hz
pub const DEFAULT_YIELD_THRESHOLD: Duration = Duration::from_micros(16_700);

/// Largest document the file readers accept: 10MB
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

pub const ENV_MIN_CONFIDENCE: &str = "WATCH_PARSER_MIN_CONFIDENCE";
pub const ENV_CHUNK_SIZE: &str = "WATCH_PARSER_CHUNK_SIZE";
pub const ENV_INTERNATIONAL: &str = "WATCH_PARSER_INTERNATIONAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Parse markup and query for entry containers, falling back to patterns
    #[default]
    Structured,
    /// Text patterns only, for contexts where markup parsing is unavailable
    PatternOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub chunk_size_hint: Option<usize>,
    pub min_confidence: u8,
    pub international_formats: bool,
    #[serde(serialize_with = "serialize_millis", deserialize_with = "deserialize_millis")]
    pub yield_threshold: Duration,
    pub extraction_mode: ExtractionMode,
    /// Pins the upper bound of the reasonableness window; defaults to the current year
    pub reference_year: Option<i32>,
    pub max_document_bytes: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            chunk_size_hint: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            international_formats: true,
            yield_threshold: DEFAULT_YIELD_THRESHOLD,
            extraction_mode: ExtractionMode::Structured,
            reference_year: None,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl ParseOptions {
    /// Load options from a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `WATCH_PARSER_*` overrides from the process environment
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = env::var(ENV_MIN_CONFIDENCE) {
            self.min_confidence = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be an integer 0-100", ENV_MIN_CONFIDENCE))?;
        }
        if let Ok(value) = env::var(ENV_CHUNK_SIZE) {
            let size: usize = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a byte count", ENV_CHUNK_SIZE))?;
            self.chunk_size_hint = Some(size);
        }
        if let Ok(value) = env::var(ENV_INTERNATIONAL) {
            self.international_formats = parse_flag(&value)
                .with_context(|| format!("{} must be true or false", ENV_INTERNATIONAL))?;
        }
        Ok(self)
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Utc::now().year())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognized flag value: {}", other),
    }
}

fn serialize_millis<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.as_secs_f64() * 1000.0)
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = f64::deserialize(deserializer)?;
    if !millis.is_finite() || millis < 0.0 {
        return Err(serde::de::Error::custom("yield_threshold must be a non-negative number"));
    }
    Ok(Duration::from_secs_f64(millis / 1000.0))
}
