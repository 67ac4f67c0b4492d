//! In-memory record capture.

use heron_core::{LogRecord, LogSink, Phase, TimingRecord, TimingSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Captures every log and timing record it receives.
///
/// Clones share storage, so one clone can be handed to a combinator while
/// the test inspects another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    logs: Arc<Mutex<Vec<LogRecord>>>,
    timings: Arc<Mutex<Vec<TimingRecord>>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log records received so far.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs.lock().clone()
    }

    /// Timing records received so far.
    #[must_use]
    pub fn timings(&self) -> Vec<TimingRecord> {
        self.timings.lock().clone()
    }

    /// Phases of the received log records, in order.
    #[must_use]
    pub fn phases(&self) -> Vec<Phase> {
        self.logs.lock().iter().map(|r| r.phase).collect()
    }

    /// Discards everything recorded.
    pub fn clear(&self) {
        self.logs.lock().clear();
        self.timings.lock().clear();
    }
}

impl LogSink for RecordingSink {
    fn emit(&self, record: &LogRecord) {
        self.logs.lock().push(record.clone());
    }
}

impl TimingSink for RecordingSink {
    fn record(&self, record: &TimingRecord) {
        self.timings.lock().push(record.clone());
    }
}
