//! Resolution counters for one parse

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::TimestampExtractionResult;

/// Running counters across resolution calls.
///
/// Owned by whoever drives a parse and passed `&mut` into each call. The
/// engine only writes to it; nothing here is read back during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub fallback_uses: u64,
    pub by_strategy: BTreeMap<String, u64>,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &TimestampExtractionResult) {
        self.attempts += 1;
        if result.metrics.used_fallback {
            self.fallback_uses += 1;
        }
        match (&result.instant, &result.strategy) {
            (Some(_), Some(strategy)) => {
                self.successes += 1;
                *self.by_strategy.entry(strategy.to_string()).or_insert(0) += 1;
            }
            _ => self.failures += 1,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.successes as f64 / self.attempts as f64
    }
}
