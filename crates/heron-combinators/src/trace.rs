//! Default sinks backed by `tracing`.

use heron_core::{LogRecord, LogSink, Phase, TimingRecord, TimingSink};

/// Forwards records to the `tracing` dispatcher as structured events.
///
/// Timing records are emitted at `DEBUG`. Call and success records are
/// emitted at `INFO`, failures at `WARN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceSink;

impl LogSink for TraceSink {
    fn emit(&self, record: &LogRecord) {
        let call_id = record.call_id.to_string();
        match record.phase {
            Phase::Call => tracing::info!(
                call_id = %call_id,
                callable = %record.callable,
                args = record.args.as_deref().unwrap_or_default(),
                "call"
            ),
            Phase::Success => tracing::info!(
                call_id = %call_id,
                callable = %record.callable,
                result = record.payload.as_deref().unwrap_or_default(),
                "returned"
            ),
            Phase::Failure => tracing::warn!(
                call_id = %call_id,
                callable = %record.callable,
                error = record.payload.as_deref().unwrap_or_default(),
                "failed"
            ),
        }
    }
}

impl TimingSink for TraceSink {
    fn record(&self, record: &TimingRecord) {
        tracing::debug!(
            callable = %record.callable,
            elapsed_us = u64::try_from(record.elapsed.as_micros()).unwrap_or(u64::MAX),
            succeeded = record.succeeded,
            "timed call"
        );
    }
}
