//! Memoization combinator.
//!
//! Caches successful results keyed by the canonical form of the full
//! argument value. Failures are never cached: the next call with the same
//! arguments invokes the callable again.
//!
//! Each wrapped callable gets its own cache unless a shared backend is
//! supplied with [`Memoize::with_backend`]. With coalescing enabled (the
//! default) concurrent misses on one key invoke the callable once; the
//! waiters then read the stored result.
//!
//! Memoization must sit outside any retry layer so only finally-successful
//! results are stored; [`Stack`](crate::Stack) and
//! [`WrapExt::with`](crate::WrapExt::with) enforce this.

use crate::cache::{CacheBackend, MemoCache};
use crate::combinator::{Combinator, LayerKind};
use crate::flight::{AsyncFlights, SyncFlights};
use crate::wrapper::{around_async, around_sync};
use heron_core::{AsyncCallable, CacheKey, EvictionPolicy, SyncCallable, WrapError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

const LAYER: &str = "memoize";

/// Caches results by argument.
pub struct Memoize<T> {
    policy: EvictionPolicy,
    backend: Option<Arc<dyn CacheBackend<T>>>,
    coalesce: bool,
}

impl<T> Memoize<T>
where
    T: Clone + Send + 'static,
{
    /// Memoizes with a fresh cache per wrapped callable.
    #[must_use]
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            backend: None,
            coalesce: true,
        }
    }

    /// Stores results in `backend` instead of a fresh cache.
    ///
    /// Every callable wrapped by this combinator shares the backend, so the
    /// caller can inspect or clear it.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn CacheBackend<T>>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Enables or disables per-key coalescing of concurrent misses.
    #[must_use]
    pub fn coalesce(mut self, enabled: bool) -> Self {
        self.coalesce = enabled;
        self
    }

    /// Returns the eviction policy for fresh caches.
    #[must_use]
    pub const fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    fn backend(&self) -> Arc<dyn CacheBackend<T>> {
        self.backend
            .clone()
            .unwrap_or_else(|| Arc::new(MemoCache::new(self.policy)))
    }
}

impl<T> Clone for Memoize<T> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy,
            backend: self.backend.clone(),
            coalesce: self.coalesce,
        }
    }
}

impl<T> fmt::Debug for Memoize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoize")
            .field("policy", &self.policy)
            .field("shared_backend", &self.backend.is_some())
            .field("coalesce", &self.coalesce)
            .finish()
    }
}

/// Memoizes with a fresh cache per wrapped callable.
#[must_use]
pub fn memoize<T>(policy: EvictionPolicy) -> Memoize<T>
where
    T: Clone + Send + 'static,
{
    Memoize::new(policy)
}

fn cache_key<A: Serialize>(callable: &str, args: &A) -> Result<CacheKey, WrapError> {
    CacheKey::from_args(args).map_err(|err| WrapError::unhashable(callable, err.to_string()))
}

impl<A, T, E> Combinator<A, T, E> for Memoize<T>
where
    A: Serialize + Send + 'static,
    T: Clone + Send + 'static,
    E: From<WrapError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        LAYER
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Memoize
    }

    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E> {
        let cache = self.backend();
        let flights = self.coalesce.then(|| Arc::new(SyncFlights::new()));

        around_sync(&inner, LAYER, move |target, args| {
            let key = cache_key(target.name(), &args)?;
            let _flight = flights.as_ref().map(|f| f.acquire(&key));

            if let Some(value) = cache.get(&key) {
                tracing::debug!(callable = target.name(), key = %key, "memo hit");
                return Ok(value);
            }

            tracing::debug!(callable = target.name(), key = %key, "memo miss");
            let value = target.call(args)?;
            cache.insert(key, value.clone());
            Ok(value)
        })
    }

    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E> {
        let cache = self.backend();
        let flights = self.coalesce.then(|| Arc::new(AsyncFlights::new()));

        around_async(&inner, LAYER, move |target, args| {
            let cache = Arc::clone(&cache);
            let flights = flights.clone();
            Box::pin(async move {
                let key = cache_key(target.name(), &args)?;
                let _flight = match &flights {
                    Some(f) => Some(f.acquire(&key).await),
                    None => None,
                };

                if let Some(value) = cache.get(&key) {
                    tracing::debug!(callable = target.name(), key = %key, "memo hit");
                    return Ok(value);
                }

                tracing::debug!(callable = target.name(), key = %key, "memo miss");
                let value = target.call(args).await?;
                cache.insert(key, value.clone());
                Ok(value)
            })
        })
    }
}
