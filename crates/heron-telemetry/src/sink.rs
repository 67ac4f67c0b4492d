//! In-memory and fan-out record sinks.

use heron_core::{LogRecord, LogSink, TimingRecord, TimingSink};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Keeps the most recent records in memory.
///
/// When full, the oldest record is dropped to make room. Clones share the
/// same buffers.
#[derive(Debug, Clone)]
pub struct MemorySink {
    capacity: usize,
    logs: Arc<Mutex<VecDeque<LogRecord>>>,
    timings: Arc<Mutex<VecDeque<TimingRecord>>>,
}

impl MemorySink {
    /// Default number of records kept per kind.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a sink keeping at most `capacity` records of each kind.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            logs: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            timings: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
        }
    }

    /// Snapshot of the retained log records, oldest first.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs.lock().iter().cloned().collect()
    }

    /// Snapshot of the retained timing records, oldest first.
    #[must_use]
    pub fn timings(&self) -> Vec<TimingRecord> {
        self.timings.lock().iter().cloned().collect()
    }

    /// Removes and returns every retained log record.
    pub fn drain_logs(&self) -> Vec<LogRecord> {
        self.logs.lock().drain(..).collect()
    }

    /// Removes and returns every retained timing record.
    pub fn drain_timings(&self) -> Vec<TimingRecord> {
        self.timings.lock().drain(..).collect()
    }

    fn push<R>(&self, buffer: &Mutex<VecDeque<R>>, record: R) {
        if self.capacity == 0 {
            return;
        }
        let mut buffer = buffer.lock();
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(record);
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        self.push(&self.logs, record.clone());
    }
}

impl TimingSink for MemorySink {
    fn record(&self, record: &TimingRecord) {
        self.push(&self.timings, record.clone());
    }
}

/// Forwards every record to each of its sinks, in registration order.
#[derive(Clone, Default)]
pub struct Fanout {
    logs: Vec<Arc<dyn LogSink>>,
    timings: Vec<Arc<dyn TimingSink>>,
}

impl Fanout {
    /// Creates a fan-out with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a log sink.
    #[must_use]
    pub fn log<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.logs.push(Arc::new(sink));
        self
    }

    /// Adds a timing sink.
    #[must_use]
    pub fn timing<S: TimingSink + 'static>(mut self, sink: S) -> Self {
        self.timings.push(Arc::new(sink));
        self
    }
}

impl fmt::Debug for Fanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fanout")
            .field("log_sinks", &self.logs.len())
            .field("timing_sinks", &self.timings.len())
            .finish()
    }
}

impl LogSink for Fanout {
    fn emit(&self, record: &LogRecord) {
        for sink in &self.logs {
            sink.emit(record);
        }
    }
}

impl TimingSink for Fanout {
    fn record(&self, record: &TimingRecord) {
        for sink in &self.timings {
            sink.record(record);
        }
    }
}
