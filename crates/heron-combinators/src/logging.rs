//! Call logging combinator.
//!
//! Emits a [`Phase::Call`](heron_core::Phase::Call) record with the rendered
//! arguments before delegation, then a success record with the rendered
//! result or a failure record with the error. Both records of one
//! invocation share a [`CallId`]. Failures are re-raised unchanged.

use crate::combinator::{Combinator, LayerKind};
use crate::trace::TraceSink;
use crate::wrapper::{around_async, around_sync};
use heron_core::{AsyncCallable, CallId, LogRecord, LogSink, SyncCallable};
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

const LAYER: &str = "logging";

/// Reports each invocation to a [`LogSink`].
#[derive(Clone)]
pub struct Logged {
    sink: Arc<dyn LogSink>,
}

impl Logged {
    /// Reports to the given sink.
    pub fn new<S: LogSink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Reports to an already shared sink.
    #[must_use]
    pub fn shared(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

impl Default for Logged {
    fn default() -> Self {
        Self::new(TraceSink)
    }
}

impl fmt::Debug for Logged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logged").finish_non_exhaustive()
    }
}

/// Logs every invocation through `tracing`.
#[must_use]
pub fn log_calls() -> Logged {
    Logged::default()
}

fn outcome_record<T: Debug, E: Display>(
    id: CallId,
    callable: &str,
    outcome: &Result<T, E>,
) -> LogRecord {
    match outcome {
        Ok(value) => LogRecord::success(id, callable, format!("{value:?}")),
        Err(err) => LogRecord::failure(id, callable, err.to_string()),
    }
}

impl<A, T, E> Combinator<A, T, E> for Logged
where
    A: Debug + Send + 'static,
    T: Debug + Send + 'static,
    E: Display + Send + 'static,
{
    fn name(&self) -> &'static str {
        LAYER
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Logging
    }

    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E> {
        let sink = Arc::clone(&self.sink);
        around_sync(&inner, LAYER, move |target, args| {
            let id = CallId::new();
            sink.emit(&LogRecord::call(id, target.name(), format!("{args:?}")));
            let outcome = target.call(args);
            sink.emit(&outcome_record(id, target.name(), &outcome));
            outcome
        })
    }

    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E> {
        let sink = Arc::clone(&self.sink);
        around_async(&inner, LAYER, move |target, args| {
            let sink = Arc::clone(&sink);
            let id = CallId::new();
            Box::pin(async move {
                sink.emit(&LogRecord::call(id, target.name(), format!("{args:?}")));
                let outcome = target.call(args).await;
                sink.emit(&outcome_record(id, target.name(), &outcome));
                outcome
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Metadata, Phase};
    use parking_lot::Mutex;

    fn collecting() -> (Logged, Arc<Mutex<Vec<LogRecord>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&records);
        let logged = Logged::new(move |r: &LogRecord| captured.lock().push(r.clone()));
        (logged, records)
    }

    fn add() -> SyncCallable<(i32, i32), i32, String> {
        SyncCallable::new(Metadata::new("add"), |(a, b): (i32, i32)| {
            a.checked_add(b).ok_or_else(|| "overflow".to_string())
        })
    }

    #[test]
    fn test_logs_call_and_success() {
        let (logged, records) = collecting();
        let wrapped = logged.wrap_sync(add());

        assert_eq!(wrapped.call((1, 2)), Ok(3));

        let records = records.lock();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].phase, Phase::Call);
        assert_eq!(records[0].args.as_deref(), Some("(1, 2)"));
        assert_eq!(records[1].phase, Phase::Success);
        assert_eq!(records[1].payload.as_deref(), Some("3"));
        assert_eq!(records[0].call_id, records[1].call_id);
        assert_eq!(records[1].callable, "add");
    }

    #[test]
    fn test_logs_failure_and_reraises() {
        let (logged, records) = collecting();
        let wrapped = logged.wrap_sync(add());

        assert_eq!(wrapped.call((i32::MAX, 1)), Err("overflow".to_string()));

        let records = records.lock();
        assert_eq!(records[1].phase, Phase::Failure);
        assert_eq!(records[1].payload.as_deref(), Some("overflow"));
    }

    #[test]
    fn test_each_call_gets_its_own_id() {
        let (logged, records) = collecting();
        let wrapped = logged.wrap_sync(add());
        wrapped.call((1, 1)).unwrap();
        wrapped.call((2, 2)).unwrap();

        let records = records.lock();
        assert_eq!(records.len(), 4);
        assert_ne!(records[0].call_id, records[2].call_id);
    }

    #[tokio::test]
    async fn test_async_call_record_emitted_when_polled() {
        let (logged, records) = collecting();
        let echo: AsyncCallable<String, String, String> =
            AsyncCallable::new(Metadata::new("echo"), |s: String| async move { Ok(s) });
        let wrapped = logged.wrap_async(echo);

        let call = wrapped.call("hi".to_string());
        assert!(records.lock().is_empty());
        assert_eq!(call.await, Ok("hi".to_string()));

        let records = records.lock();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].args.as_deref(), Some("\"hi\""));
        assert_eq!(records[1].payload.as_deref(), Some("\"hi\""));
    }
}
