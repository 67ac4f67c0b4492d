//! Timing combinator.
//!
//! Measures wall-clock time from entry to exit of every invocation and
//! reports one [`TimingRecord`] per invocation, whether it succeeded or not.
//! Failures are re-raised unchanged after the record is emitted.
//!
//! For suspending callables the measurement spans the awaited future, so
//! time spent suspended counts toward the elapsed time.

use crate::combinator::{Combinator, LayerKind};
use crate::trace::TraceSink;
use crate::wrapper::{around_async, around_sync};
use heron_core::{AsyncCallable, SyncCallable, TimingRecord, TimingSink};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

const LAYER: &str = "timing";

/// Reports elapsed time of each invocation to a [`TimingSink`].
#[derive(Clone)]
pub struct Timed {
    sink: Arc<dyn TimingSink>,
}

impl Timed {
    /// Reports to the given sink.
    pub fn new<S: TimingSink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Reports to an already shared sink.
    #[must_use]
    pub fn shared(sink: Arc<dyn TimingSink>) -> Self {
        Self { sink }
    }
}

impl Default for Timed {
    fn default() -> Self {
        Self::new(TraceSink)
    }
}

impl fmt::Debug for Timed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timed").finish_non_exhaustive()
    }
}

/// Times every invocation, reporting through `tracing`.
#[must_use]
pub fn time_it() -> Timed {
    Timed::default()
}

impl<A, T, E> Combinator<A, T, E> for Timed
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn name(&self) -> &'static str {
        LAYER
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Timing
    }

    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E> {
        let sink = Arc::clone(&self.sink);
        around_sync(&inner, LAYER, move |target, args| {
            let started = Instant::now();
            let outcome = target.call(args);
            sink.record(&TimingRecord::new(
                target.name(),
                started.elapsed(),
                outcome.is_ok(),
            ));
            outcome
        })
    }

    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E> {
        let sink = Arc::clone(&self.sink);
        around_async(&inner, LAYER, move |target, args| {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                let started = Instant::now();
                let outcome = target.call(args).await;
                sink.record(&TimingRecord::new(
                    target.name(),
                    started.elapsed(),
                    outcome.is_ok(),
                ));
                outcome
            })
        })
    }
}
