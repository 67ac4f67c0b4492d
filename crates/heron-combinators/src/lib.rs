//! # Heron Combinators
//!
//! Function-wrapping combinators for Heron callables.
//!
//! Each combinator turns a callable into a wrapper with the same signature,
//! calling contract, and metadata, adding one cross-cutting behavior:
//!
//! | Combinator | Constructor | Behavior |
//! |------------|-------------|----------|
//! | [`Timed`] | [`time_it`] | Reports elapsed time per invocation |
//! | [`Memoize`] | [`memoize`] | Caches successful results by argument |
//! | [`Logged`] | [`log_calls`] | Emits call and outcome records |
//! | [`Require`] | [`require`] | Rejects arguments failing a predicate |
//! | [`Authorize`] | [`require_capability`] | Rejects callers lacking permission |
//! | [`Retry`] | [`retry`] | Re-invokes on retryable failures with backoff |
//!
//! Every combinator has a synchronous and an asynchronous implementation;
//! [`Combinator::wrap`] picks the one matching the callable at wrap time.
//!
//! ## Stacking
//!
//! Combinators nest. A [`Stack`] applies them in order, first layer
//! innermost, and rejects orderings where retry would wrap memoization.
//! [`WrapExt::with`] applies the same check one layer at a time.
//!
//! ```text
//! caller → time_it → log_calls → memoize → retry → f
//! ```
//!
//! ## Example
//!
//! ```
//! use heron_combinators::{memoize, Combinator};
//! use heron_core::{EvictionPolicy, Metadata, SyncCallable, WrapError};
//!
//! let fib: SyncCallable<u64, u64, WrapError> = SyncCallable::new(
//!     Metadata::new("fib").with_doc("Iterative Fibonacci.").param("n"),
//!     |n| {
//!         let (mut a, mut b) = (0_u64, 1_u64);
//!         for _ in 0..n {
//!             (a, b) = (b, a + b);
//!         }
//!         Ok(a)
//!     },
//! );
//!
//! let cached = memoize(EvictionPolicy::lru(128)).wrap_sync(fib);
//! assert_eq!(cached.call(50), Ok(12_586_269_025));
//! assert_eq!(cached.name(), "fib");
//! ```

#![doc(html_root_url = "https://docs.rs/heron-combinators/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod authorization;
pub mod cache;
pub mod combinator;
pub mod dispatch;
pub mod flight;
pub mod logging;
pub mod memoize;
pub mod retry;
pub mod stack;
pub mod timing;
mod trace;
pub mod validation;
pub mod wrapper;

// Re-export main types at crate root
pub use authorization::{require_capability, Authorize, PolicyDecision, PolicyEvaluator};
pub use cache::{CacheBackend, CacheStats, MemoCache};
pub use combinator::{Combinator, LayerKind, WrapExt};
pub use dispatch::dispatch;
pub use logging::{log_calls, Logged};
pub use memoize::{memoize, Memoize};
pub use retry::{retry, Retry, RetryState, RetryStep};
pub use stack::{check_wrap, validate_order, BoxedCombinator, Stack, StackBuilder};
pub use timing::{time_it, Timed};
pub use trace::TraceSink;
pub use validation::{require, Require};
pub use wrapper::{around_async, around_sync, AfterHook, BeforeHook, Wrapper};
