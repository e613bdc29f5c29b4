//! Offload executor
//!
//! Runs the same pipeline as [`super::parse`] on a dedicated worker thread.
//! The worker owns its copy of the document and options; the caller only
//! ever sees [`WorkerMessage`]s. One worker handles exactly one document.

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::scheduler::{Scheduler, panic_message};
use super::summary::generate_summary;
use crate::config::ParseOptions;
use crate::models::{ChunkProgress, ImportSummary, WatchRecord};

static WORKER_IDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    Progress(ChunkProgress),
    Complete { records: Vec<WatchRecord>, summary: ImportSummary },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum OffloadError {
    #[error("Failed to start parse worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("Parse worker exited without reporting a result")]
    Disconnected,

    #[error("Parse worker failed: {0}")]
    Worker(String),
}

pub struct OffloadExecutor;

impl OffloadExecutor {
    /// Start a worker thread parsing `document`
    pub fn spawn(document: String, options: ParseOptions) -> Result<OffloadHandle, OffloadError> {
        let (sender, receiver) = unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_flag = Arc::clone(&cancelled);
        let id = WORKER_IDS.fetch_add(1, Ordering::Relaxed);

        let thread = thread::Builder::new()
            .name(format!("watch-parse-{id}"))
            .spawn(move || run_worker(&document, &options, &worker_flag, &sender))
            .map_err(OffloadError::Spawn)?;
        debug!("Started parse worker {}", id);

        Ok(OffloadHandle { receiver, cancelled, thread: Some(thread) })
    }
}

fn run_worker(
    document: &str,
    options: &ParseOptions,
    cancelled: &AtomicBool,
    sender: &Sender<WorkerMessage>,
) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        Scheduler::new(options)
            .on_progress(|progress| {
                let _ = sender.send(WorkerMessage::Progress(progress.clone()));
            })
            .cancel_when(|| cancelled.load(Ordering::Relaxed))
            .run(document)
    }));

    let message = match result {
        Ok(outcome) => {
            let summary = generate_summary(&outcome.records);
            WorkerMessage::Complete { records: outcome.records, summary }
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!("Parse worker panicked: {}", message);
            WorkerMessage::Error { message }
        }
    };
    // The receiver may already be gone; nobody is left to tell
    let _ = sender.send(message);
}

pub struct OffloadHandle {
    receiver: Receiver<WorkerMessage>,
    cancelled: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl OffloadHandle {
    pub fn messages(&self) -> &Receiver<WorkerMessage> {
        &self.receiver
    }

    /// Ask the worker to stop at the next chunk boundary. It still sends
    /// `Complete` with the records collected so far.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) -> Result<(Vec<WatchRecord>, ImportSummary), OffloadError> {
        self.wait_with_progress(|_| {})
    }

    /// Drain messages until the worker finishes, passing progress along
    pub fn wait_with_progress(
        mut self,
        mut on_progress: impl FnMut(&ChunkProgress),
    ) -> Result<(Vec<WatchRecord>, ImportSummary), OffloadError> {
        let result = loop {
            match self.receiver.recv() {
                Ok(WorkerMessage::Progress(progress)) => on_progress(&progress),
                Ok(WorkerMessage::Complete { records, summary }) => break Ok((records, summary)),
                Ok(WorkerMessage::Error { message }) => break Err(OffloadError::Worker(message)),
                Err(_) => break Err(OffloadError::Disconnected),
            }
        };
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse;

    fn document(count: usize) -> String {
        (0..count)
            .map(|n| {
                format!(
                    r#"<div class="outer-cell"><div class="content-cell">Watched <a href="https://www.youtube.com/watch?v=offload{n:04}">Clip {n}</a><br>Jun 3, 2024, 7:45:00 AM UTC<br></div></div>"#
                )
            })
            .collect()
    }

    fn options() -> ParseOptions {
        ParseOptions { chunk_size_hint: Some(4096), reference_year: Some(2025), ..ParseOptions::default() }
    }

    #[test]
    fn test_offload_matches_direct_parse() {
        let document = document(50);
        let direct = parse(&document, &options());

        let handle = OffloadExecutor::spawn(document, options()).unwrap();
        let mut reports = 0;
        let (records, summary) = handle.wait_with_progress(|_| reports += 1).unwrap();

        assert!(reports >= 1);
        assert_eq!(records.len(), direct.len());
        assert_eq!(summary.total_records, 50);
        for (offloaded, local) in records.iter().zip(&direct) {
            assert_eq!(offloaded.content_key(), local.content_key());
            assert_eq!(offloaded.watched_at, local.watched_at);
        }
    }

    #[test]
    fn test_final_message_is_complete() {
        let handle = OffloadExecutor::spawn(document(5), options()).unwrap();
        let messages: Vec<_> = handle.messages().iter().collect();

        assert!(matches!(messages.last(), Some(WorkerMessage::Complete { .. })));
        assert!(
            messages[..messages.len() - 1]
                .iter()
                .all(|m| matches!(m, WorkerMessage::Progress(_)))
        );
    }

    #[test]
    fn test_cancel_before_start_still_completes() {
        let handle = OffloadExecutor::spawn(document(200), options()).unwrap();
        handle.cancel();
        let (records, _) = handle.wait().unwrap();
        assert!(records.len() <= 200);
    }

    #[test]
    fn test_message_wire_format() {
        let message = WorkerMessage::Error { message: "boom".to_string() };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "boom");
    }
}
