//! Ordered combinator stacks.
//!
//! A [`Stack`] applies a list of combinators to a callable, first layer
//! innermost. Applying `[retry, memoize]` produces `memoize(retry(f))`: a call
//! enters memoization first and reaches retry only on a miss.
//!
//! ## Ordering Rules
//!
//! Assembly rejects a stack where retry would wrap memoization. Memoization
//! outside retry stores only the finally-successful result of a retried
//! call; the reverse order would retry cache lookups instead of the work.
//!
//! ```text
//! caller → memoize → retry → f      accepted
//! caller → retry → memoize → f      rejected: StackError::RetryOutsideMemoize
//! ```

use crate::combinator::{Combinator, LayerKind};
use heron_core::{AnyCallable, AsyncCallable, StackError, SyncCallable};
use std::fmt;
use std::sync::Arc;

/// A type-erased combinator that can be stored in a stack.
pub type BoxedCombinator<A, T, E> = Arc<dyn Combinator<A, T, E>>;

/// Checks layer kinds, given in application order, against the ordering
/// rules.
pub fn validate_order(kinds: &[LayerKind]) -> Result<(), StackError> {
    for (memoize_layer, kind) in kinds.iter().enumerate() {
        if *kind != LayerKind::Memoize {
            continue;
        }
        if let Some(offset) = kinds[memoize_layer + 1..]
            .iter()
            .position(|k| *k == LayerKind::Retry)
        {
            return Err(StackError::RetryOutsideMemoize {
                retry_layer: memoize_layer + 1 + offset,
                memoize_layer,
            });
        }
    }
    Ok(())
}

/// Checks that wrapping a callable already carrying `layers` with a
/// combinator of `kind` keeps memoization outside retry.
///
/// Positions in the error count from the innermost existing layer; the new
/// layer sits at `layers.len()`.
pub fn check_wrap(layers: &[&'static str], kind: LayerKind) -> Result<(), StackError> {
    if kind != LayerKind::Retry {
        return Ok(());
    }
    match layers
        .iter()
        .position(|name| *name == LayerKind::Memoize.as_str())
    {
        Some(memoize_layer) => Err(StackError::RetryOutsideMemoize {
            retry_layer: layers.len(),
            memoize_layer,
        }),
        None => Ok(()),
    }
}

/// A validated, immutable list of combinators.
///
/// # Example
///
/// ```
/// use heron_combinators::{log_calls, memoize, retry, time_it, Stack};
/// use heron_core::{BackoffPolicy, EvictionPolicy};
/// use heron_test::{flaky_sync, CallCounter, TestError};
/// use std::time::Duration;
///
/// let stack: Stack<(), u32, TestError> = Stack::builder()
///     .layer(retry(3, BackoffPolicy::constant(Duration::from_millis(1)), TestError::classify))
///     .layer(memoize(EvictionPolicy::lru(16)))
///     .layer(log_calls())
///     .layer(time_it())
///     .build()
///     .unwrap();
///
/// assert_eq!(stack.execution_order(), vec!["timing", "logging", "memoize", "retry"]);
///
/// let counter = CallCounter::new();
/// let fetch = stack.apply_sync(flaky_sync("fetch", &counter, 1, 42_u32)).unwrap();
/// assert_eq!(fetch.call(()), Ok(42));
/// assert_eq!(fetch.call(()), Ok(42));
/// assert_eq!(counter.count(), 2);
/// ```
pub struct Stack<A, T, E> {
    layers: Vec<BoxedCombinator<A, T, E>>,
}

impl<A, T, E> Stack<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
{
    /// Creates a new stack builder.
    #[must_use]
    pub fn builder() -> StackBuilder<A, T, E> {
        StackBuilder::new()
    }

    /// Applies every layer to a callable of either contract.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::RetryOutsideMemoize`] when the callable is
    /// already memoized and the stack adds a retry layer.
    pub fn apply(
        &self,
        callable: impl Into<AnyCallable<A, T, E>>,
    ) -> Result<AnyCallable<A, T, E>, StackError> {
        let callable = callable.into();
        self.check_input(callable.layers())?;
        Ok(self
            .layers
            .iter()
            .fold(callable, |acc, layer| layer.wrap(acc)))
    }

    /// Applies every layer to a synchronous callable.
    ///
    /// # Errors
    ///
    /// See [`Stack::apply`].
    pub fn apply_sync(
        &self,
        callable: SyncCallable<A, T, E>,
    ) -> Result<SyncCallable<A, T, E>, StackError> {
        self.check_input(callable.layers())?;
        Ok(self
            .layers
            .iter()
            .fold(callable, |acc, layer| layer.wrap_sync(acc)))
    }

    /// Applies every layer to an asynchronous callable.
    ///
    /// # Errors
    ///
    /// See [`Stack::apply`].
    pub fn apply_async(
        &self,
        callable: AsyncCallable<A, T, E>,
    ) -> Result<AsyncCallable<A, T, E>, StackError> {
        self.check_input(callable.layers())?;
        Ok(self
            .layers
            .iter()
            .fold(callable, |acc, layer| layer.wrap_async(acc)))
    }

    fn check_input(&self, existing: &[&'static str]) -> Result<(), StackError> {
        if existing.is_empty() {
            return Ok(());
        }
        let mut names = existing.to_vec();
        for layer in &self.layers {
            check_wrap(&names, layer.kind())?;
            names.push(layer.name());
        }
        Ok(())
    }

    /// Layer names in application order, innermost first.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    /// Layer names in the order a call passes through them, outermost first.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&'static str> {
        self.layers.iter().rev().map(|layer| layer.name()).collect()
    }

    /// Layer kinds in application order.
    #[must_use]
    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(|layer| layer.kind()).collect()
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<A, T, E> Clone for Stack<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<A: 'static, T: 'static, E: 'static> fmt::Debug for Stack<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("layers", &self.layer_names())
            .finish()
    }
}

/// Builder for [`Stack`].
pub struct StackBuilder<A, T, E> {
    layers: Vec<BoxedCombinator<A, T, E>>,
}

impl<A, T, E> StackBuilder<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
{
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Adds a layer outside the ones added so far.
    #[must_use]
    pub fn layer<C>(mut self, combinator: C) -> Self
    where
        C: Combinator<A, T, E>,
    {
        self.layers.push(Arc::new(combinator));
        self
    }

    /// Adds an already shared layer.
    #[must_use]
    pub fn layer_shared(mut self, combinator: BoxedCombinator<A, T, E>) -> Self {
        self.layers.push(combinator);
        self
    }

    /// Validates the ordering rules and builds the stack.
    pub fn build(self) -> Result<Stack<A, T, E>, StackError> {
        let kinds: Vec<LayerKind> = self.layers.iter().map(|layer| layer.kind()).collect();
        validate_order(&kinds)?;
        Ok(Stack {
            layers: self.layers,
        })
    }
}

impl<A: 'static, T: 'static, E: 'static> Default for StackBuilder<A, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memoize, retry, time_it, MemoCache, CacheBackend};
    use heron_core::{always_retry, BackoffPolicy, Contract, Described, EvictionPolicy, Metadata};
    use heron_test::{flaky_async, flaky_sync, CallCounter, TestError};
    use std::time::Duration;

    fn quick_retry() -> crate::Retry<TestError> {
        retry(3, BackoffPolicy::constant(Duration::from_millis(1)), always_retry)
    }

    #[test]
    fn test_validate_order() {
        use crate::combinator::LayerKind::{Logging, Memoize, Retry, Timing};
        assert!(validate_order(&[]).is_ok());
        assert!(validate_order(&[Retry, Memoize, Logging]).is_ok());
        assert_eq!(
            validate_order(&[Timing, Memoize, Logging, Retry]),
            Err(StackError::RetryOutsideMemoize {
                retry_layer: 3,
                memoize_layer: 1
            })
        );
    }

    #[test]
    fn test_retry_outside_memoize_is_rejected() {
        let result = Stack::<(), u32, TestError>::builder()
            .layer(memoize(EvictionPolicy::Unbounded))
            .layer(quick_retry())
            .build();
        assert!(matches!(result, Err(StackError::RetryOutsideMemoize { .. })));
    }

    #[test]
    fn test_memoize_outside_retry_caches_final_success() {
        let counter = CallCounter::new();
        let cache: Arc<MemoCache<u32>> = Arc::new(MemoCache::new(EvictionPolicy::Unbounded));

        let stack: Stack<(), u32, TestError> = Stack::builder()
            .layer(quick_retry())
            .layer(memoize(EvictionPolicy::Unbounded).with_backend(cache.clone()))
            .build()
            .unwrap();
        let wrapped = stack
            .apply_sync(flaky_sync("fetch", &counter, 2, 11_u32))
            .unwrap();

        assert_eq!(wrapped.call(()), Ok(11));
        assert_eq!(counter.count(), 3);
        assert_eq!(cache.len(), 1);

        assert_eq!(wrapped.call(()), Ok(11));
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn test_metadata_survives_full_stack() {
        let counter = CallCounter::new();
        let stack: Stack<(), u32, TestError> = Stack::builder()
            .layer(quick_retry())
            .layer(memoize(EvictionPolicy::lru(4)))
            .layer(time_it())
            .build()
            .unwrap();
        let inner = flaky_sync("fetch", &counter, 0, 1_u32);
        let wrapped = stack.apply_sync(inner.clone()).unwrap();

        assert_eq!(wrapped.metadata(), inner.metadata());
        assert_eq!(wrapped.layers(), ["retry", "memoize", "timing"]);
        assert_eq!(stack.execution_order(), vec!["timing", "memoize", "retry"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_keeps_contract() {
        let counter = CallCounter::new();
        let stack: Stack<(), u32, TestError> = Stack::builder()
            .layer(quick_retry())
            .layer(memoize(EvictionPolicy::Unbounded))
            .build()
            .unwrap();

        let wrapped = stack
            .apply(flaky_async("fetch_async", &counter, 1, 5_u32))
            .unwrap();
        assert_eq!(wrapped.contract(), Contract::Suspending);
        assert_eq!(wrapped.invoke(()).await, Ok(5));
        assert_eq!(wrapped.invoke(()).await, Ok(5));
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_empty_stack_is_identity() {
        let stack: Stack<i32, i32, TestError> = Stack::builder().build().unwrap();
        let f = SyncCallable::new(Metadata::new("id"), Ok);
        assert!(stack.is_empty());
        assert_eq!(stack.apply_sync(f).unwrap().call(3), Ok(3));
    }

    #[test]
    fn test_check_wrap() {
        assert!(check_wrap(&[], LayerKind::Retry).is_ok());
        assert!(check_wrap(&["memoize"], LayerKind::Timing).is_ok());
        assert!(check_wrap(&["retry", "timing"], LayerKind::Retry).is_ok());
        assert_eq!(
            check_wrap(&["timing", "memoize"], LayerKind::Retry),
            Err(StackError::RetryOutsideMemoize {
                retry_layer: 2,
                memoize_layer: 1
            })
        );
    }

    #[test]
    fn test_apply_rejects_retry_around_memoized_input() {
        let counter = CallCounter::new();
        let memoized = memoize(EvictionPolicy::Unbounded)
            .wrap_sync(flaky_sync("fetch", &counter, 0, 1_u32));
        let stack: Stack<(), u32, TestError> = Stack::builder()
            .layer(time_it())
            .layer(quick_retry())
            .build()
            .unwrap();

        assert_eq!(
            stack.apply_sync(memoized).unwrap_err(),
            StackError::RetryOutsideMemoize {
                retry_layer: 2,
                memoize_layer: 0
            }
        );
    }

    #[test]
    fn test_apply_accepts_pre_wrapped_input_without_memoize() {
        let counter = CallCounter::new();
        let retried = quick_retry().wrap_sync(flaky_sync("fetch", &counter, 1, 8_u32));
        let stack: Stack<(), u32, TestError> = Stack::builder()
            .layer(memoize(EvictionPolicy::Unbounded))
            .build()
            .unwrap();

        let wrapped = stack.apply_sync(retried).unwrap();
        assert_eq!(wrapped.call(()), Ok(8));
        assert_eq!(wrapped.call(()), Ok(8));
        assert_eq!(counter.count(), 2);
        assert_eq!(wrapped.layers(), ["retry", "memoize"]);
    }
}
