//! Core combinator trait.
//!
//! A [`Combinator`] turns a callable into a wrapper with the same argument,
//! result, and failure types, the same calling contract, and the same
//! metadata. Every combinator provides one implementation per contract; the
//! default [`Combinator::wrap`] picks between them through
//! [`dispatch`](crate::dispatch::dispatch).
//!
//! # Invariants
//!
//! - A wrapper MUST delegate to the callable it wraps, at most once per
//!   invocation unless it is a retry controller.
//! - A wrapper MUST NOT change the failure type; its own failures enter the
//!   callable's error type through `From<WrapError>`.
//! - A wrapper MUST publish the wrapped callable's metadata.
//!
//! # Example
//!
//! ```
//! use heron_combinators::{Combinator, LayerKind};
//! use heron_core::{AsyncCallable, SyncCallable};
//!
//! struct Doubling;
//!
//! impl<E: Send + 'static> Combinator<i64, i64, E> for Doubling {
//!     fn name(&self) -> &'static str {
//!         "doubling"
//!     }
//!
//!     fn wrap_sync(&self, inner: SyncCallable<i64, i64, E>) -> SyncCallable<i64, i64, E> {
//!         let target = inner.clone();
//!         inner.delegate("doubling", move |x| target.call(x).map(|v| v * 2))
//!     }
//!
//!     fn wrap_async(&self, inner: AsyncCallable<i64, i64, E>) -> AsyncCallable<i64, i64, E> {
//!         let target = inner.clone();
//!         inner.delegate("doubling", move |x| {
//!             let fut = target.call(x);
//!             Box::pin(async move { fut.await.map(|v| v * 2) })
//!         })
//!     }
//! }
//! ```

use crate::stack::check_wrap;
use heron_core::{AnyCallable, AsyncCallable, StackError, SyncCallable};
use std::fmt;

/// The role a combinator plays in a stack.
///
/// Stack assembly uses the kind to enforce ordering rules between layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Measures elapsed time.
    Timing,
    /// Caches results by argument.
    Memoize,
    /// Emits call and outcome records.
    Logging,
    /// Rejects arguments failing a predicate.
    Validation,
    /// Rejects callers lacking permission.
    Authorization,
    /// Re-invokes on retryable failures.
    Retry,
    /// Any other wrapper.
    Custom,
}

impl LayerKind {
    /// Returns the kind name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timing => "timing",
            Self::Memoize => "memoize",
            Self::Logging => "logging",
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Retry => "retry",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function-wrapping combinator.
///
/// Implementors provide a synchronous and an asynchronous implementation.
/// [`wrap`](Combinator::wrap) selects the one matching the callable's
/// contract.
///
/// These methods wrap unconditionally. Layer ordering is checked by
/// [`WrapExt::with`] and [`Stack`](crate::Stack).
pub trait Combinator<A, T, E>: Send + Sync + 'static
where
    A: 'static,
    T: 'static,
    E: 'static,
{
    /// Returns the layer name recorded on wrapped callables.
    fn name(&self) -> &'static str;

    /// Returns the layer role used for stack ordering checks.
    fn kind(&self) -> LayerKind {
        LayerKind::Custom
    }

    /// Wraps a synchronous callable.
    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E>;

    /// Wraps an asynchronous callable.
    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E>;

    /// Wraps a callable of either contract, keeping that contract.
    fn wrap(&self, inner: AnyCallable<A, T, E>) -> AnyCallable<A, T, E> {
        crate::dispatch::dispatch(
            inner,
            |c| self.wrap_sync(c),
            |c| self.wrap_async(c),
        )
    }
}

/// Method-call syntax for applying a combinator.
///
/// Unlike the bare [`Combinator`] methods, `with` checks the layers the
/// callable already carries and refuses to put retry around memoization.
///
/// ```
/// use heron_combinators::{time_it, WrapExt};
/// use heron_core::{Metadata, SyncCallable};
///
/// let add: SyncCallable<(i32, i32), i32, std::convert::Infallible> =
///     SyncCallable::new(Metadata::new("add"), |(a, b)| Ok(a + b));
///
/// let timed = add.with(&time_it()).unwrap();
/// assert_eq!(timed.call((1, 2)), Ok(3));
/// assert_eq!(timed.layers(), ["timing"]);
/// ```
pub trait WrapExt<A, T, E>: Sized
where
    A: 'static,
    T: 'static,
    E: 'static,
{
    /// Applies `combinator` to `self`.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::RetryOutsideMemoize`] when `combinator` is a
    /// retry layer and `self` is already memoized.
    fn with<C: Combinator<A, T, E> + ?Sized>(self, combinator: &C) -> Result<Self, StackError>;
}

impl<A: 'static, T: 'static, E: 'static> WrapExt<A, T, E> for SyncCallable<A, T, E> {
    fn with<C: Combinator<A, T, E> + ?Sized>(self, combinator: &C) -> Result<Self, StackError> {
        check_wrap(self.layers(), combinator.kind())?;
        Ok(combinator.wrap_sync(self))
    }
}

impl<A: 'static, T: 'static, E: 'static> WrapExt<A, T, E> for AsyncCallable<A, T, E> {
    fn with<C: Combinator<A, T, E> + ?Sized>(self, combinator: &C) -> Result<Self, StackError> {
        check_wrap(self.layers(), combinator.kind())?;
        Ok(combinator.wrap_async(self))
    }
}

impl<A: 'static, T: 'static, E: 'static> WrapExt<A, T, E> for AnyCallable<A, T, E> {
    fn with<C: Combinator<A, T, E> + ?Sized>(self, combinator: &C) -> Result<Self, StackError> {
        check_wrap(self.layers(), combinator.kind())?;
        Ok(combinator.wrap(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memoize, retry};
    use heron_core::{always_retry, BackoffPolicy, Contract, Described, EvictionPolicy, Metadata};
    use heron_test::{flaky_async, flaky_sync, CallCounter, TestError};
    use std::convert::Infallible;
    use std::time::Duration;

    struct Negate;

    impl Combinator<i64, i64, Infallible> for Negate {
        fn name(&self) -> &'static str {
            "negate"
        }

        fn wrap_sync(
            &self,
            inner: SyncCallable<i64, i64, Infallible>,
        ) -> SyncCallable<i64, i64, Infallible> {
            let target = inner.clone();
            inner.delegate("negate", move |x| target.call(x).map(|v| -v))
        }

        fn wrap_async(
            &self,
            inner: AsyncCallable<i64, i64, Infallible>,
        ) -> AsyncCallable<i64, i64, Infallible> {
            let target = inner.clone();
            inner.delegate("negate", move |x| {
                let fut = target.call(x);
                Box::pin(async move { fut.await.map(|v| -v) })
            })
        }
    }

    fn square() -> SyncCallable<i64, i64, Infallible> {
        SyncCallable::new(Metadata::new("square").param("x"), |x| Ok(x * x))
    }

    #[test]
    fn test_default_kind_is_custom() {
        let c: &dyn Combinator<i64, i64, Infallible> = &Negate;
        assert_eq!(c.kind(), LayerKind::Custom);
        assert_eq!(c.name(), "negate");
    }

    #[test]
    fn test_wrap_keeps_sync_contract() {
        let wrapped = Negate.wrap(square().into());
        assert_eq!(wrapped.contract(), Contract::Synchronous);
        assert_eq!(wrapped.as_sync().unwrap().call(3), Ok(-9));
        assert_eq!(wrapped.metadata().name(), "square");
    }

    #[tokio::test]
    async fn test_wrap_keeps_async_contract() {
        let cube: AsyncCallable<i64, i64, Infallible> =
            AsyncCallable::new(Metadata::new("cube"), |x| async move { Ok(x * x * x) });
        let wrapped = Negate.wrap(cube.into());
        assert_eq!(wrapped.contract(), Contract::Suspending);
        assert_eq!(wrapped.as_async().unwrap().call(2).await, Ok(-8));
    }

    #[test]
    fn test_with_extension() {
        let wrapped = square().with(&Negate).unwrap().with(&Negate).unwrap();
        assert_eq!(wrapped.call(4), Ok(16));
        assert_eq!(wrapped.layers(), ["negate", "negate"]);
    }

    fn quick_retry() -> crate::Retry<TestError> {
        retry(3, BackoffPolicy::constant(Duration::ZERO), always_retry)
    }

    #[test]
    fn test_with_rejects_retry_around_memoize() {
        let counter = CallCounter::new();
        let memoized = flaky_sync("fetch", &counter, 1, 3_u32)
            .with(&memoize(EvictionPolicy::Unbounded))
            .unwrap();

        let err = memoized.with(&quick_retry()).unwrap_err();
        assert_eq!(
            err,
            StackError::RetryOutsideMemoize {
                retry_layer: 1,
                memoize_layer: 0
            }
        );
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_with_accepts_memoize_around_retry() {
        let counter = CallCounter::new();
        let wrapped = flaky_sync("fetch", &counter, 1, 3_u32)
            .with(&quick_retry())
            .unwrap()
            .with(&memoize(EvictionPolicy::Unbounded))
            .unwrap();

        assert_eq!(wrapped.call(()), Ok(3));
        assert_eq!(wrapped.call(()), Ok(3));
        assert_eq!(counter.count(), 2);
        assert_eq!(wrapped.layers(), ["retry", "memoize"]);
    }

    #[test]
    fn test_with_checks_any_callable() {
        let counter = CallCounter::new();
        let memoized = AnyCallable::from(flaky_async("fetch", &counter, 0, 1_u8))
            .with(&crate::time_it())
            .unwrap()
            .with(&memoize(EvictionPolicy::lru(8)))
            .unwrap();

        assert!(matches!(
            memoized.with(&quick_retry()),
            Err(StackError::RetryOutsideMemoize {
                retry_layer: 2,
                memoize_layer: 1
            })
        ));
    }

    #[test]
    fn test_layer_kind_display() {
        assert_eq!(LayerKind::Memoize.to_string(), "memoize");
        assert_eq!(LayerKind::Retry.as_str(), "retry");
    }
}
