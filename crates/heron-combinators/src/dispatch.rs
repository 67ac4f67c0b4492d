//! Contract dispatch.
//!
//! A combinator with two implementations, one per calling contract, applies
//! the one matching the callable at wrap time. The choice is made once: the
//! resulting wrapper never inspects the contract again on invocation.

use heron_core::{AnyCallable, AsyncCallable, SyncCallable};

/// Applies `sync_impl` or `async_impl` according to the callable's contract.
///
/// The wrapper returned by either implementation keeps the contract of the
/// callable it was given.
///
/// # Example
///
/// ```
/// use heron_combinators::dispatch;
/// use heron_core::{AnyCallable, Contract, Metadata, SyncCallable};
///
/// let f: SyncCallable<u8, u8, ()> = SyncCallable::new(Metadata::new("id"), Ok);
/// let picked = dispatch(AnyCallable::from(f), |c| c, |c| c);
/// assert_eq!(picked.contract(), Contract::Synchronous);
/// ```
pub fn dispatch<A, T, E, S, X>(
    callable: AnyCallable<A, T, E>,
    sync_impl: S,
    async_impl: X,
) -> AnyCallable<A, T, E>
where
    S: FnOnce(SyncCallable<A, T, E>) -> SyncCallable<A, T, E>,
    X: FnOnce(AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E>,
{
    match callable {
        AnyCallable::Sync(inner) => {
            tracing::trace!(callable = inner.name(), contract = "synchronous", "dispatching wrapper");
            AnyCallable::Sync(sync_impl(inner))
        }
        AnyCallable::Async(inner) => {
            tracing::trace!(callable = inner.name(), contract = "suspending", "dispatching wrapper");
            AnyCallable::Async(async_impl(inner))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Contract, Metadata};
    use std::cell::Cell;

    #[test]
    fn test_sync_callable_takes_sync_impl() {
        let f: SyncCallable<u8, u8, ()> = SyncCallable::new(Metadata::new("id"), Ok);
        let picked = Cell::new("");

        let out = dispatch(
            f.into(),
            |c| {
                picked.set("sync");
                c
            },
            |c| {
                picked.set("async");
                c
            },
        );

        assert_eq!(picked.get(), "sync");
        assert_eq!(out.contract(), Contract::Synchronous);
    }

    #[test]
    fn test_async_callable_takes_async_impl() {
        let f: AsyncCallable<u8, u8, ()> =
            AsyncCallable::new(Metadata::new("id"), |x| async move { Ok(x) });
        let picked = Cell::new("");

        let out = dispatch(
            f.into(),
            |c| {
                picked.set("sync");
                c
            },
            |c| {
                picked.set("async");
                c
            },
        );

        assert_eq!(picked.get(), "async");
        assert_eq!(out.contract(), Contract::Suspending);
    }
}
