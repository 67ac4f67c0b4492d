//! The callable model.
//!
//! A callable is an opaque unit of behavior taking one argument value `A`
//! (a tuple for multi-argument callables) and producing `Result<T, E>`. It
//! commits to one of two calling contracts at construction time:
//!
//! - [`SyncCallable`] runs to completion on the calling thread.
//! - [`AsyncCallable`] returns a future that yields to the scheduler at its
//!   suspension points.
//!
//! [`AnyCallable`] is the tagged variant over both, used by combinators that
//! pick the matching implementation at wrap time.
//!
//! Callables are cheap to clone: the body and metadata live behind `Arc`s,
//! so a wrapper holds a reference to the callable it delegates to without
//! taking it away from the caller.
//!
//! # Example
//!
//! ```
//! use heron_core::{Metadata, SyncCallable};
//!
//! let add: SyncCallable<(i64, i64), i64, std::convert::Infallible> =
//!     SyncCallable::new(Metadata::new("add"), |(a, b)| Ok(a + b));
//!
//! assert_eq!(add.call((2, 3)), Ok(5));
//! ```

use crate::metadata::{copy_metadata, Described, Metadata};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type SyncBody<A, T, E> = dyn Fn(A) -> Result<T, E> + Send + Sync;
type AsyncBody<A, T, E> = dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync;

/// The concurrency contract a callable commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contract {
    /// Runs to completion when called.
    Synchronous,
    /// Returns control to a scheduler at suspension points.
    Suspending,
}

impl Contract {
    /// Returns the contract name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Synchronous => "synchronous",
            Self::Suspending => "suspending",
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A callable that runs to completion on the calling thread.
pub struct SyncCallable<A, T, E> {
    meta: Arc<Metadata>,
    layers: Vec<&'static str>,
    body: Arc<SyncBody<A, T, E>>,
}

impl<A, T, E> SyncCallable<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
{
    /// Creates a synchronous callable from a function and its metadata.
    pub fn new<F>(metadata: Metadata, f: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            meta: Arc::new(metadata),
            layers: Vec::new(),
            body: Arc::new(f),
        }
    }

    /// Builds a wrapper that delegates to `f` and republishes this
    /// callable's metadata.
    ///
    /// `layer` is appended to the wrapper's layer list.
    pub fn delegate<F>(&self, layer: &'static str, f: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        let mut wrapper = Self::new(Metadata::synthetic(layer), f);
        copy_metadata(self, &mut wrapper);
        wrapper.layers.clone_from(&self.layers);
        wrapper.layers.push(layer);
        wrapper
    }
}

impl<A, T, E> SyncCallable<A, T, E> {
    /// Invokes the callable.
    pub fn call(&self, args: A) -> Result<T, E> {
        (self.body)(args)
    }

    /// Names of the combinators applied to this callable, innermost first.
    #[must_use]
    pub fn layers(&self) -> &[&'static str] {
        &self.layers
    }

    /// Returns the callable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.meta.name()
    }
}

impl<A, T, E> Clone for SyncCallable<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            meta: Arc::clone(&self.meta),
            layers: self.layers.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<A, T, E> Described for SyncCallable<A, T, E> {
    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        Arc::make_mut(&mut self.meta)
    }
}

impl<A, T, E> fmt::Debug for SyncCallable<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCallable")
            .field("name", &self.meta.name())
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

/// A callable whose invocation returns a future.
pub struct AsyncCallable<A, T, E> {
    meta: Arc<Metadata>,
    layers: Vec<&'static str>,
    body: Arc<AsyncBody<A, T, E>>,
}

impl<A, T, E> AsyncCallable<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
{
    /// Creates an asynchronous callable from an async function and its
    /// metadata.
    pub fn new<F, Fut>(metadata: Metadata, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::from_boxed(metadata, move |args: A| -> BoxFuture<'static, Result<T, E>> {
            Box::pin(f(args))
        })
    }

    /// Creates an asynchronous callable from a function already returning a
    /// boxed future.
    pub fn from_boxed<F>(metadata: Metadata, f: F) -> Self
    where
        F: Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync + 'static,
    {
        Self {
            meta: Arc::new(metadata),
            layers: Vec::new(),
            body: Arc::new(f),
        }
    }

    /// Builds a wrapper that delegates to `f` and republishes this
    /// callable's metadata.
    pub fn delegate<F>(&self, layer: &'static str, f: F) -> Self
    where
        F: Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync + 'static,
    {
        let mut wrapper = Self::from_boxed(Metadata::synthetic(layer), f);
        copy_metadata(self, &mut wrapper);
        wrapper.layers.clone_from(&self.layers);
        wrapper.layers.push(layer);
        wrapper
    }
}

impl<A, T, E> AsyncCallable<A, T, E> {
    /// Invokes the callable, returning its future.
    pub fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>> {
        (self.body)(args)
    }

    /// Names of the combinators applied to this callable, innermost first.
    #[must_use]
    pub fn layers(&self) -> &[&'static str] {
        &self.layers
    }

    /// Returns the callable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.meta.name()
    }
}

impl<A, T, E> Clone for AsyncCallable<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            meta: Arc::clone(&self.meta),
            layers: self.layers.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<A, T, E> Described for AsyncCallable<A, T, E> {
    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        Arc::make_mut(&mut self.meta)
    }
}

impl<A, T, E> fmt::Debug for AsyncCallable<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCallable")
            .field("name", &self.meta.name())
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

/// A callable of either contract, selected at construction time.
pub enum AnyCallable<A, T, E> {
    /// Runs to completion on the calling thread.
    Sync(SyncCallable<A, T, E>),
    /// Suspends at await points.
    Async(AsyncCallable<A, T, E>),
}

impl<A, T, E> AnyCallable<A, T, E> {
    /// Returns the calling contract.
    #[must_use]
    pub const fn contract(&self) -> Contract {
        match self {
            Self::Sync(_) => Contract::Synchronous,
            Self::Async(_) => Contract::Suspending,
        }
    }

    /// Names of the combinators applied to this callable, innermost first.
    #[must_use]
    pub fn layers(&self) -> &[&'static str] {
        match self {
            Self::Sync(c) => c.layers(),
            Self::Async(c) => c.layers(),
        }
    }

    /// Returns the callable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata().name()
    }

    /// Returns the synchronous callable, if that is the contract.
    #[must_use]
    pub const fn as_sync(&self) -> Option<&SyncCallable<A, T, E>> {
        match self {
            Self::Sync(c) => Some(c),
            Self::Async(_) => None,
        }
    }

    /// Returns the asynchronous callable, if that is the contract.
    #[must_use]
    pub const fn as_async(&self) -> Option<&AsyncCallable<A, T, E>> {
        match self {
            Self::Sync(_) => None,
            Self::Async(c) => Some(c),
        }
    }

    /// Unwraps into the synchronous callable, if that is the contract.
    pub fn into_sync(self) -> Option<SyncCallable<A, T, E>> {
        match self {
            Self::Sync(c) => Some(c),
            Self::Async(_) => None,
        }
    }

    /// Unwraps into the asynchronous callable, if that is the contract.
    pub fn into_async(self) -> Option<AsyncCallable<A, T, E>> {
        match self {
            Self::Sync(_) => None,
            Self::Async(c) => Some(c),
        }
    }

    /// Invokes the callable through a future regardless of its contract.
    ///
    /// This is a differently-shaped adapter: for a synchronous callable the
    /// body runs to completion on the calling thread *before* the returned
    /// future is produced, and the future is already ready. Use the typed
    /// accessors when the original calling convention must be kept.
    pub fn invoke(&self, args: A) -> BoxFuture<'static, Result<T, E>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        match self {
            Self::Sync(c) => Box::pin(std::future::ready(c.call(args))),
            Self::Async(c) => c.call(args),
        }
    }
}

impl<A, T, E> Clone for AnyCallable<A, T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(c) => Self::Sync(c.clone()),
            Self::Async(c) => Self::Async(c.clone()),
        }
    }
}

impl<A, T, E> Described for AnyCallable<A, T, E> {
    fn metadata(&self) -> &Metadata {
        match self {
            Self::Sync(c) => c.metadata(),
            Self::Async(c) => c.metadata(),
        }
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Sync(c) => c.metadata_mut(),
            Self::Async(c) => c.metadata_mut(),
        }
    }
}

impl<A, T, E> fmt::Debug for AnyCallable<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(c) => f.debug_tuple("Sync").field(c).finish(),
            Self::Async(c) => f.debug_tuple("Async").field(c).finish(),
        }
    }
}

impl<A, T, E> From<SyncCallable<A, T, E>> for AnyCallable<A, T, E> {
    fn from(callable: SyncCallable<A, T, E>) -> Self {
        Self::Sync(callable)
    }
}

impl<A, T, E> From<AsyncCallable<A, T, E>> for AnyCallable<A, T, E> {
    fn from(callable: AsyncCallable<A, T, E>) -> Self {
        Self::Async(callable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn add() -> SyncCallable<(i64, i64), i64, Infallible> {
        SyncCallable::new(
            Metadata::new("add").with_doc("Adds two numbers.").param("a").param("b"),
            |(a, b)| Ok(a + b),
        )
    }

    fn fetch_rate() -> AsyncCallable<(String, String), f64, Infallible> {
        AsyncCallable::new(Metadata::new("fetch_rate"), |(from, to): (String, String)| async move {
            tokio::task::yield_now().await;
            Ok(if from == "EUR" && to == "USD" { 1.18 } else { 0.0 })
        })
    }

    #[test]
    fn test_sync_call() {
        assert_eq!(add().call((1999, 2999)), Ok(4998));
    }

    #[test]
    fn test_delegate_republishes_metadata() {
        let inner = add();
        let wrapper = inner.delegate("timing", {
            let inner = inner.clone();
            move |args| inner.call(args)
        });

        assert_eq!(wrapper.name(), "add");
        assert_eq!(wrapper.metadata().doc(), Some("Adds two numbers."));
        assert_eq!(wrapper.metadata().params().len(), 2);
        assert_eq!(wrapper.layers(), &["timing"]);
        assert!(inner.layers().is_empty());
    }

    #[test]
    fn test_nested_delegates_keep_original_identity() {
        let inner = add();
        let once = inner.delegate("timing", {
            let inner = inner.clone();
            move |args| inner.call(args)
        });
        let twice = once.delegate("logging", {
            let once = once.clone();
            move |args| once.call(args)
        });

        assert_eq!(twice.name(), "add");
        assert_eq!(twice.layers(), &["timing", "logging"]);
        assert_eq!(twice.call((1, 2)), Ok(3));
    }

    #[test]
    fn test_sync_body_does_not_run_until_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callable: SyncCallable<(), (), Infallible> =
            SyncCallable::new(Metadata::new("touch"), move |()| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        callable.call(()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_call() {
        let rate = fetch_rate()
            .call(("EUR".to_string(), "USD".to_string()))
            .await
            .unwrap();
        assert!((rate - 1.18).abs() < f64::EPSILON);
    }

    #[test]
    fn test_any_callable_contract() {
        let sync: AnyCallable<_, _, _> = add().into();
        let suspending: AnyCallable<_, _, _> = fetch_rate().into();

        assert_eq!(sync.contract(), Contract::Synchronous);
        assert_eq!(suspending.contract(), Contract::Suspending);
        assert!(sync.as_sync().is_some());
        assert!(suspending.as_async().is_some());
        assert_eq!(suspending.name(), "fetch_rate");
    }

    #[tokio::test]
    async fn test_invoke_adapter_runs_both_contracts() {
        let sync: AnyCallable<_, _, _> = add().into();
        assert_eq!(sync.invoke((2, 2)).await, Ok(4));

        let suspending: AnyCallable<_, _, _> = fetch_rate().into();
        let rate = suspending
            .invoke(("EUR".to_string(), "GBP".to_string()))
            .await
            .unwrap();
        assert!(rate.abs() < f64::EPSILON);
    }

    #[test]
    fn test_contract_display() {
        assert_eq!(Contract::Synchronous.to_string(), "synchronous");
        assert_eq!(Contract::Suspending.to_string(), "suspending");
    }
}
