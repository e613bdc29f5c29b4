use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Progress snapshot emitted between chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkProgress {
    pub processed_records: usize,
    pub total_chunks: usize,
    pub percentage: f64,
    pub eta: Option<Duration>,
    /// 1-based index of the chunk just finished
    pub current_chunk: usize,
}

impl ChunkProgress {
    pub fn is_final(&self) -> bool {
        self.current_chunk >= self.total_chunks
    }
}
