//! Validation guard.
//!
//! Checks the arguments against one or more predicates before delegation.
//! The first failing predicate short-circuits the call with a
//! [`WrapError::PreconditionViolation`] carrying its message; the wrapped
//! callable is never invoked.
//!
//! # Example
//!
//! ```
//! use heron_combinators::{require, Combinator};
//! use heron_core::{Metadata, SyncCallable, WrapError};
//!
//! let sqrt: SyncCallable<f64, f64, WrapError> =
//!     SyncCallable::new(Metadata::new("sqrt"), |x: f64| Ok(x.sqrt()));
//!
//! let guarded = require(|x: &f64| *x >= 0.0, "x must be non-negative").wrap_sync(sqrt);
//! assert_eq!(guarded.call(9.0), Ok(3.0));
//! assert!(matches!(
//!     guarded.call(-1.0),
//!     Err(WrapError::PreconditionViolation { .. })
//! ));
//! ```

use crate::combinator::{Combinator, LayerKind};
use crate::wrapper::Wrapper;
use heron_core::{AsyncCallable, SyncCallable, WrapError};
use std::fmt;
use std::sync::Arc;

const LAYER: &str = "validation";

type Predicate<A> = Arc<dyn Fn(&A) -> bool + Send + Sync>;

/// Rejects arguments that fail any of its predicates.
pub struct Require<A> {
    rules: Vec<(Predicate<A>, String)>,
}

impl<A> Require<A> {
    /// Creates a guard with one predicate.
    pub fn new<P>(predicate: P, message: impl Into<String>) -> Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self {
            rules: vec![(Arc::new(predicate), message.into())],
        }
    }

    /// Adds a predicate, checked after the existing ones.
    #[must_use]
    pub fn and<P>(mut self, predicate: P, message: impl Into<String>) -> Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.rules.push((Arc::new(predicate), message.into()));
        self
    }

    /// Message of the first failing predicate, if any.
    pub fn check(&self, args: &A) -> Option<&str> {
        self.rules
            .iter()
            .find(|(predicate, _)| !predicate(args))
            .map(|(_, message)| message.as_str())
    }

    fn wrapper<T, E>(&self) -> Wrapper<A, T, E>
    where
        A: 'static,
        T: 'static,
        E: From<WrapError> + 'static,
    {
        let rules = self.rules.clone();
        Wrapper::new(LAYER)
            .with_kind(LayerKind::Validation)
            .before(move |meta, args| {
                match rules.iter().find(|(predicate, _)| !predicate(args)) {
                    Some((_, message)) => Err(WrapError::precondition(meta.name(), message).into()),
                    None => Ok(()),
                }
            })
    }
}

impl<A> Clone for Require<A> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<A> fmt::Debug for Require<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.rules.iter().map(|(_, m)| m.as_str()).collect();
        f.debug_struct("Require").field("rules", &messages).finish()
    }
}

/// Guards a callable with a single predicate.
pub fn require<A, P>(predicate: P, message: impl Into<String>) -> Require<A>
where
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    Require::new(predicate, message)
}

impl<A, T, E> Combinator<A, T, E> for Require<A>
where
    A: Send + 'static,
    T: Send + 'static,
    E: From<WrapError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        LAYER
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Validation
    }

    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E> {
        self.wrapper().wrap_sync(inner)
    }

    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E> {
        self.wrapper().wrap_async(inner)
    }
}
