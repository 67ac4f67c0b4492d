//! Ready-made callables for exercising combinators.

use crate::counter::CallCounter;
use crate::error::TestError;
use heron_core::{AsyncCallable, Metadata, SyncCallable};
use std::time::Duration;

/// A synchronous callable that fails with [`TestError::Transient`] on its
/// first `failures` invocations and returns `value` afterwards.
///
/// Every invocation is recorded on `counter`.
pub fn flaky_sync<T>(
    name: &str,
    counter: &CallCounter,
    failures: usize,
    value: T,
) -> SyncCallable<(), T, TestError>
where
    T: Clone + Send + Sync + 'static,
{
    let counter = counter.clone();
    SyncCallable::new(Metadata::new(name), move |()| {
        if counter.hit() <= failures {
            Err(TestError::Transient)
        } else {
            Ok(value.clone())
        }
    })
}

/// The suspending counterpart of [`flaky_sync`].
pub fn flaky_async<T>(
    name: &str,
    counter: &CallCounter,
    failures: usize,
    value: T,
) -> AsyncCallable<(), T, TestError>
where
    T: Clone + Send + Sync + 'static,
{
    let counter = counter.clone();
    AsyncCallable::new(Metadata::new(name), move |()| {
        let outcome = if counter.hit() <= failures {
            Err(TestError::Transient)
        } else {
            Ok(value.clone())
        };
        async move {
            tokio::task::yield_now().await;
            outcome
        }
    })
}

/// A synchronous callable that applies `f` and counts each invocation.
pub fn counting<A, T, F>(name: &str, counter: &CallCounter, f: F) -> SyncCallable<A, T, TestError>
where
    A: 'static,
    T: 'static,
    F: Fn(A) -> T + Send + Sync + 'static,
{
    let counter = counter.clone();
    SyncCallable::new(Metadata::new(name), move |args| {
        counter.hit();
        Ok(f(args))
    })
}

/// A synchronous callable that always fails with the given error.
pub fn always_failing<A, T>(
    name: &str,
    counter: &CallCounter,
    error: TestError,
) -> SyncCallable<A, T, TestError>
where
    A: 'static,
    T: 'static,
{
    let counter = counter.clone();
    SyncCallable::new(Metadata::new(name), move |_| {
        counter.hit();
        Err(error.clone())
    })
}

/// A suspending callable that sleeps for `delay` and echoes its argument.
///
/// Under a paused tokio clock the sleep completes as soon as the runtime is
/// idle.
pub fn sleeping<A>(name: &str, counter: &CallCounter, delay: Duration) -> AsyncCallable<A, A, TestError>
where
    A: Send + 'static,
{
    let counter = counter.clone();
    AsyncCallable::new(Metadata::new(name), move |args| {
        counter.hit();
        async move {
            tokio::time::sleep(delay).await;
            Ok(args)
        }
    })
}
