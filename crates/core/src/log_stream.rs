//! Run log stream and the sink seam through which collaborators append.
//!
//! The stream itself is a plain append-only vector; locking and run
//! ownership live in the pipeline engine, which holds the active run's
//! stream exclusively.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::types::{LogCategory, LogEntry};

/// Append-only, time-ordered sequence of log entries for one run.
#[derive(Debug, Default)]
pub struct LogStream {
    entries: Vec<LogEntry>,
}

impl LogStream {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends one entry, preserving insertion order.
    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Ordered copy of the entries for the observer.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    /// Empties the stream. The engine only calls this while no run is in
    /// flight.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trait for appending run-scoped log entries from outside the engine.
/// The run id lets implementations drop entries from stale runs.
pub trait LogSink: Send + Sync {
    fn append(&self, run: Uuid, category: LogCategory, message: String);
}

/// No-op sink for tests and collaborators that don't need the feed.
pub struct NoOpSink;

impl LogSink for NoOpSink {
    fn append(&self, _run: Uuid, _category: LogCategory, _message: String) {}
}

/// In-memory sink that captures appends for testing.
#[derive(Default)]
pub struct CaptureSink {
    entries: Mutex<Vec<(Uuid, LogCategory, String)>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(Uuid, LogCategory, String)> {
        self.entries.lock().expect("log sink mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().expect("log sink mutex poisoned").len()
    }

    pub fn count_category(&self, category: LogCategory) -> usize {
        self.entries
            .lock()
            .expect("log sink mutex poisoned")
            .iter()
            .filter(|(_, c, _)| *c == category)
            .count()
    }
}

impl LogSink for CaptureSink {
    fn append(&self, run: Uuid, category: LogCategory, message: String) {
        self.entries
            .lock()
            .expect("log sink mutex poisoned")
            .push((run, category, message));
    }
}

/// Convenience: create a no-op sink for collaborators that don't need one.
pub fn noop_sink() -> Arc<dyn LogSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
