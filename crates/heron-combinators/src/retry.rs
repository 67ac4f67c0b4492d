//! Retry controller.
//!
//! Re-invokes the wrapped callable on failures the classifier marks
//! retryable, up to `max_attempts` attempts in total, waiting between
//! attempts per the [`BackoffPolicy`]. When attempts run out, or a failure is
//! fatal, the last failure is returned unchanged.
//!
//! Synchronous callables wait by blocking the calling thread. Suspending
//! callables wait with `tokio::time::sleep`, so other tasks keep running.
//!
//! A [`CancelToken`] stops the loop before the next attempt. Cancellation
//! observed during a backoff wait ends the wait immediately. Either way the
//! call fails with [`WrapError::Cancelled`].
//!
//! Attempt state is created per invocation; the token is not. A token given
//! to [`Retry::with_cancel`] is shared by every call through the wrapper, so
//! once it is cancelled each later call fails before its first attempt. To
//! cancel one call, wrap per call with its own token; wrapping only clones
//! `Arc`s.
//!
//! # Example
//!
//! ```
//! use heron_combinators::{retry, Combinator};
//! use heron_core::BackoffPolicy;
//! use heron_test::{flaky_sync, CallCounter, TestError};
//! use std::time::Duration;
//!
//! let counter = CallCounter::new();
//! let fetch = flaky_sync("fetch", &counter, 2, "payload");
//!
//! let wrapped = retry(3, BackoffPolicy::constant(Duration::from_millis(1)), TestError::classify)
//!     .wrap_sync(fetch);
//! assert_eq!(wrapped.call(()), Ok("payload"));
//! assert_eq!(counter.count(), 3);
//! ```

use crate::combinator::{Combinator, LayerKind};
use crate::wrapper::{around_async, around_sync};
use heron_core::{AsyncCallable, BackoffPolicy, CancelToken, Classification, SyncCallable, WrapError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const LAYER: &str = "retry";

/// What the controller does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Return the failure.
    Stop,
    /// Wait, then attempt again.
    Wait(Duration),
}

/// Attempt bookkeeping shared by both calling contracts.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempts: u32,
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl RetryState {
    /// Creates the state for a fresh invocation.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            attempts: 0,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Attempts started so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records the start of an attempt.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Decides the next step after a failed attempt.
    pub fn on_failure(&self, classification: Classification) -> RetryStep {
        if !classification.is_retryable() || self.attempts >= self.max_attempts {
            RetryStep::Stop
        } else {
            RetryStep::Wait(self.backoff.delay_for(self.attempts))
        }
    }
}

type Classifier<E> = Arc<dyn Fn(&E) -> Classification + Send + Sync>;

/// Re-invokes on retryable failures.
pub struct Retry<E> {
    max_attempts: u32,
    backoff: BackoffPolicy,
    classify: Classifier<E>,
    cancel: Option<CancelToken>,
}

impl<E> Retry<E> {
    /// Creates a retry controller.
    ///
    /// `max_attempts` counts the first attempt; zero is treated as one.
    pub fn new<C>(max_attempts: u32, backoff: BackoffPolicy, classify: C) -> Self
    where
        C: Fn(&E) -> Classification + Send + Sync + 'static,
    {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            classify: Arc::new(classify),
            cancel: None,
        }
    }

    /// Stops retrying once `token` is cancelled.
    ///
    /// Cancellation is permanent for wrappers built from this controller:
    /// calls made after the token is cancelled return
    /// [`WrapError::Cancelled`] with zero attempts.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Total attempts allowed per invocation.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The backoff schedule.
    #[must_use]
    pub const fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }
}

impl<E> Clone for Retry<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            classify: Arc::clone(&self.classify),
            cancel: self.cancel.clone(),
        }
    }
}

impl<E> fmt::Debug for Retry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

/// Retries up to `max_attempts` attempts in total.
pub fn retry<E, C>(max_attempts: u32, backoff: BackoffPolicy, classify: C) -> Retry<E>
where
    C: Fn(&E) -> Classification + Send + Sync + 'static,
{
    Retry::new(max_attempts, backoff, classify)
}

fn log_retry(callable: &str, attempt: u32, delay: Duration) {
    tracing::warn!(
        callable,
        attempt,
        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        "attempt failed, retrying"
    );
}

impl<A, T, E> Combinator<A, T, E> for Retry<E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: From<WrapError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        LAYER
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Retry
    }

    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E> {
        let config = self.clone();
        around_sync(&inner, LAYER, move |target, args| {
            let mut state = RetryState::new(config.max_attempts, config.backoff);
            loop {
                if config.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                    return Err(WrapError::cancelled(target.name(), state.attempts()).into());
                }
                state.begin_attempt();

                let err = match target.call(args.clone()) {
                    Ok(value) => return Ok(value),
                    Err(err) => err,
                };
                let RetryStep::Wait(delay) = state.on_failure((config.classify)(&err)) else {
                    return Err(err);
                };

                log_retry(target.name(), state.attempts(), delay);
                match &config.cancel {
                    Some(token) => {
                        if token.wait_timeout(delay) {
                            return Err(WrapError::cancelled(target.name(), state.attempts()).into());
                        }
                    }
                    None => std::thread::sleep(delay),
                }
            }
        })
    }

    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E> {
        let config = self.clone();
        around_async(&inner, LAYER, move |target, args| {
            let config = config.clone();
            Box::pin(async move {
                let mut state = RetryState::new(config.max_attempts, config.backoff);
                loop {
                    if config.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                        return Err(WrapError::cancelled(target.name(), state.attempts()).into());
                    }
                    state.begin_attempt();

                    let err = match target.call(args.clone()).await {
                        Ok(value) => return Ok(value),
                        Err(err) => err,
                    };
                    let RetryStep::Wait(delay) = state.on_failure((config.classify)(&err)) else {
                        return Err(err);
                    };

                    log_retry(target.name(), state.attempts(), delay);
                    match &config.cancel {
                        Some(token) => {
                            tokio::select! {
                                () = tokio::time::sleep(delay) => {}
                                () = token.cancelled() => {
                                    return Err(WrapError::cancelled(target.name(), state.attempts()).into());
                                }
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{always_retry, never_retry, Metadata};
    use heron_test::{always_failing, flaky_sync, CallCounter, TestError};
    use std::time::Instant;

    #[test]
    fn test_state_machine() {
        let mut state = RetryState::new(3, BackoffPolicy::exponential(Duration::from_millis(10)));
        state.begin_attempt();
        assert_eq!(
            state.on_failure(Classification::Retryable),
            RetryStep::Wait(Duration::from_millis(10))
        );
        state.begin_attempt();
        assert_eq!(
            state.on_failure(Classification::Retryable),
            RetryStep::Wait(Duration::from_millis(20))
        );
        assert_eq!(state.on_failure(Classification::Fatal), RetryStep::Stop);
        state.begin_attempt();
        assert_eq!(state.on_failure(Classification::Retryable), RetryStep::Stop);
        assert_eq!(state.attempts(), 3);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let mut state = RetryState::new(0, BackoffPolicy::default());
        state.begin_attempt();
        assert_eq!(state.on_failure(Classification::Retryable), RetryStep::Stop);
    }

    #[test]
    fn test_exhausted_attempts_return_last_failure() {
        let counter = CallCounter::new();
        let hits = counter.clone();
        let always: SyncCallable<(), (), TestError> =
            SyncCallable::new(Metadata::new("always"), move |()| {
                Err(TestError::Permanent(format!("attempt {}", hits.hit())))
            });

        let delay = Duration::from_millis(10);
        let wrapped = retry(3, BackoffPolicy::exponential(delay), always_retry).wrap_sync(always);

        let started = Instant::now();
        let err = wrapped.call(()).unwrap_err();

        assert_eq!(err, TestError::Permanent("attempt 3".to_string()));
        assert_eq!(counter.count(), 3);
        assert!(started.elapsed() >= delay + delay * 2);
    }

    #[test]
    fn test_fatal_failure_is_not_retried() {
        let counter = CallCounter::new();
        let broken: SyncCallable<(), (), TestError> =
            always_failing("broken", &counter, TestError::Transient);

        let wrapped = retry(5, BackoffPolicy::constant(Duration::ZERO), never_retry).wrap_sync(broken);
        assert_eq!(wrapped.call(()), Err(TestError::Transient));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_classifier_selects_retryable_failures() {
        let counter = CallCounter::new();
        let flaky = flaky_sync("fetch", &counter, 2, 7_u32);
        let wrapped = retry(3, BackoffPolicy::constant(Duration::from_millis(1)), TestError::classify)
            .wrap_sync(flaky);

        assert_eq!(wrapped.call(()), Ok(7));
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn test_cancel_stops_before_next_attempt() {
        let token = CancelToken::new();
        let counter = CallCounter::new();
        let hits = counter.clone();
        let canceller = token.clone();
        let failing: SyncCallable<(), (), TestError> =
            SyncCallable::new(Metadata::new("failing"), move |()| {
                if hits.hit() == 2 {
                    canceller.cancel();
                }
                Err(TestError::Transient)
            });

        let wrapped = retry(10, BackoffPolicy::constant(Duration::from_millis(1)), always_retry)
            .with_cancel(token)
            .wrap_sync(failing);

        let err = wrapped.call(()).unwrap_err();
        assert_eq!(err, TestError::Wrap(WrapError::cancelled("failing", 2)));
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_cancel_interrupts_backoff_wait() {
        let token = CancelToken::new();
        let canceller = token.clone();
        let failing: SyncCallable<(), (), TestError> =
            SyncCallable::new(Metadata::new("failing"), |()| Err(TestError::Transient));
        let wrapped = retry(2, BackoffPolicy::constant(Duration::from_secs(30)), always_retry)
            .with_cancel(token)
            .wrap_sync(failing);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let started = Instant::now();
        let err = wrapped.call(()).unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, TestError::Wrap(WrapError::Cancelled { attempts: 1, .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_cancelled_token_disables_later_calls() {
        let token = CancelToken::new();
        let counter = CallCounter::new();
        let controller = retry(3, BackoffPolicy::constant(Duration::ZERO), TestError::classify);
        let wrapped = controller
            .clone()
            .with_cancel(token.clone())
            .wrap_sync(flaky_sync("fetch", &counter, 0, 5_u8));

        assert_eq!(wrapped.call(()), Ok(5));
        token.cancel();
        assert_eq!(
            wrapped.call(()),
            Err(TestError::Wrap(WrapError::cancelled("fetch", 0)))
        );
        assert_eq!(counter.count(), 1);

        let per_call = controller
            .with_cancel(CancelToken::new())
            .wrap_sync(flaky_sync("fetch", &counter, 0, 5_u8));
        assert_eq!(per_call.call(()), Ok(5));
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_attempts_restart_per_invocation() {
        let counter = CallCounter::new();
        let failing = always_failing("down", &counter, TestError::Transient);
        let wrapped: SyncCallable<(), (), TestError> =
            retry(2, BackoffPolicy::constant(Duration::ZERO), always_retry).wrap_sync(failing);

        assert_eq!(wrapped.call(()), Err(TestError::Transient));
        assert_eq!(counter.count(), 2);
        assert_eq!(wrapped.call(()), Err(TestError::Transient));
        assert_eq!(counter.count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_backoff_uses_scheduler_time() {
        let counter = CallCounter::new();
        let hits = counter.clone();
        let flaky: AsyncCallable<u8, u8, TestError> =
            AsyncCallable::new(Metadata::new("flaky_async"), move |x| {
                let hits = hits.clone();
                async move {
                    if hits.hit() < 3 {
                        Err(TestError::Transient)
                    } else {
                        Ok(x)
                    }
                }
            });

        let delay = Duration::from_millis(100);
        let wrapped = retry(3, BackoffPolicy::exponential(delay), always_retry).wrap_async(flaky);

        let started = tokio::time::Instant::now();
        assert_eq!(wrapped.call(4).await, Ok(4));
        assert!(started.elapsed() >= delay * 3);
        assert_eq!(counter.count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_cancel_during_wait() {
        let token = CancelToken::new();
        let failing: AsyncCallable<(), (), TestError> =
            AsyncCallable::new(Metadata::new("failing"), |()| async { Err(TestError::Transient) });
        let wrapped = retry(5, BackoffPolicy::constant(Duration::from_secs(60)), always_retry)
            .with_cancel(token.clone())
            .wrap_async(failing);

        let call = tokio::spawn(wrapped.call(()));
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err, TestError::Wrap(WrapError::cancelled("failing", 1)));
    }
}
