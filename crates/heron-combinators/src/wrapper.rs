//! The wrapper core.
//!
//! Every combinator in this crate is built from the two primitives here:
//!
//! - [`around_sync`] and [`around_async`] build a wrapper whose body receives
//!   the wrapped callable and the arguments, and decides how to delegate.
//! - [`Wrapper`] covers the common case of a check before delegation and a
//!   transformation of the outcome after it.
//!
//! Both publish the wrapped callable's metadata on the wrapper and keep its
//! calling contract.

use crate::combinator::{Combinator, LayerKind};
use heron_core::{AsyncCallable, BoxFuture, Described, Metadata, SyncCallable};
use std::fmt;
use std::sync::Arc;

/// Wraps a synchronous callable with a body that controls delegation.
pub fn around_sync<A, T, E, F>(
    inner: &SyncCallable<A, T, E>,
    layer: &'static str,
    body: F,
) -> SyncCallable<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
    F: Fn(&SyncCallable<A, T, E>, A) -> Result<T, E> + Send + Sync + 'static,
{
    let target = inner.clone();
    inner.delegate(layer, move |args| body(&target, args))
}

/// Wraps an asynchronous callable with a body that controls delegation.
///
/// The body receives its own handle to the wrapped callable so the returned
/// future can outlive the call to the body.
pub fn around_async<A, T, E, F>(
    inner: &AsyncCallable<A, T, E>,
    layer: &'static str,
    body: F,
) -> AsyncCallable<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
    F: Fn(AsyncCallable<A, T, E>, A) -> BoxFuture<'static, Result<T, E>> + Send + Sync + 'static,
{
    let target = inner.clone();
    inner.delegate(layer, move |args| body(target.clone(), args))
}

/// Hook run before delegation. An error short-circuits the call.
pub type BeforeHook<A, E> = Arc<dyn Fn(&Metadata, &A) -> Result<(), E> + Send + Sync>;

/// Hook run on the outcome of delegation.
pub type AfterHook<T, E> = Arc<dyn Fn(&Metadata, Result<T, E>) -> Result<T, E> + Send + Sync>;

/// A combinator assembled from before and after hooks.
///
/// With no hooks the wrapper delegates unchanged. A failing before hook
/// prevents delegation entirely.
///
/// # Example
///
/// ```
/// use heron_combinators::{Combinator, Wrapper};
/// use heron_core::{Metadata, SyncCallable};
///
/// let half: SyncCallable<i32, i32, String> =
///     SyncCallable::new(Metadata::new("half"), |x| Ok(x / 2));
///
/// let even_only = Wrapper::new("even-only").before(|meta, x: &i32| {
///     if x % 2 == 0 {
///         Ok(())
///     } else {
///         Err(format!("{} needs an even number", meta.name()))
///     }
/// });
///
/// let guarded = even_only.wrap_sync(half);
/// assert_eq!(guarded.call(8), Ok(4));
/// assert_eq!(guarded.call(3), Err("half needs an even number".to_string()));
/// ```
pub struct Wrapper<A, T, E> {
    name: &'static str,
    kind: LayerKind,
    before: Option<BeforeHook<A, E>>,
    after: Option<AfterHook<T, E>>,
}

impl<A, T, E> Wrapper<A, T, E> {
    /// Creates a wrapper with no hooks.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            kind: LayerKind::Custom,
            before: None,
            after: None,
        }
    }

    /// Sets the layer kind reported to stacks.
    #[must_use]
    pub fn with_kind(mut self, kind: LayerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the hook run before delegation.
    #[must_use]
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Metadata, &A) -> Result<(), E> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Sets the hook run on the outcome.
    #[must_use]
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Metadata, Result<T, E>) -> Result<T, E> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }
}

impl<A, T, E> Clone for Wrapper<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            kind: self.kind,
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

impl<A, T, E> fmt::Debug for Wrapper<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

impl<A, T, E> Combinator<A, T, E> for Wrapper<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> LayerKind {
        self.kind
    }

    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E> {
        let meta = Arc::new(inner.metadata().clone());
        let before = self.before.clone();
        let after = self.after.clone();

        around_sync(&inner, self.name, move |target, args| {
            if let Some(hook) = &before {
                hook(&meta, &args)?;
            }
            let outcome = target.call(args);
            match &after {
                Some(hook) => hook(&meta, outcome),
                None => outcome,
            }
        })
    }

    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E> {
        let meta = Arc::new(inner.metadata().clone());
        let before = self.before.clone();
        let after = self.after.clone();

        around_async(&inner, self.name, move |target, args| {
            let meta = Arc::clone(&meta);
            let before = before.clone();
            let after = after.clone();
            Box::pin(async move {
                if let Some(hook) = &before {
                    hook(&meta, &args)?;
                }
                let outcome = target.call(args).await;
                match &after {
                    Some(hook) => hook(&meta, outcome),
                    None => outcome,
                }
            })
        })
    }
}
