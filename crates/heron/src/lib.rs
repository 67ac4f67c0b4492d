//! # Heron
//!
//! **Function-wrapping combinators for Rust callables**
//!
//! Heron wraps a callable in another with the same signature, calling
//! contract, and metadata, adding one cross-cutting behavior per layer:
//!
//! - ⏱️ **Timing** – elapsed time per invocation, to a pluggable sink
//! - 🗃️ **Memoization** – results cached by canonical argument key, with LRU or TTL eviction
//! - 📝 **Call logging** – a record before delegation and one for the outcome
//! - 🚧 **Validation** – argument predicates checked before the body runs
//! - 🔐 **Authorization** – capability or allow-list checks against the caller's context
//! - 🔁 **Retry** – classified failures re-attempted on a backoff schedule
//!
//! Every combinator works on both synchronous and suspending callables.
//!
//! ## Quick Start
//!
//! ```
//! use heron::prelude::*;
//!
//! let square: SyncCallable<u64, u64, WrapError> =
//!     SyncCallable::new(Metadata::new("square").param("n"), |n| Ok(n * n));
//!
//! let stack: Stack<u64, u64, WrapError> = Stack::builder()
//!     .layer(memoize(EvictionPolicy::lru(64)))
//!     .layer(require(|n: &u64| *n < 1 << 32, "n is too large"))
//!     .layer(time_it())
//!     .build()
//!     .unwrap();
//!
//! let wrapped = stack.apply_sync(square).unwrap();
//!
//! assert_eq!(wrapped.call(12), Ok(144));
//! assert_eq!(wrapped.name(), "square");
//! assert_eq!(wrapped.layers(), ["memoize", "validation", "timing"]);
//! ```
//!
//! ## Layering
//!
//! Layers apply innermost first. Memoization must sit outside retry, so a
//! cached value is only ever a final result:
//!
//! ```text
//! caller → time_it → log_calls → memoize → retry → f
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Callable model, metadata, errors, and policies.
pub use heron_core as core;

/// The combinators and their composition stack.
pub use heron_combinators as combinators;

/// Logging setup, sinks, and call metrics.
pub use heron_telemetry as telemetry;

/// Layered configuration for combinator defaults.
pub use heron_config as config;

/// Prelude module for convenient imports.
///
/// ```
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use heron_core::{
        always_retry, never_retry, AnyCallable, AsyncCallable, AuthContext, BackoffPolicy,
        CancelToken, CarriesAuthContext, Classification, Contract, Described, EvictionPolicy,
        Metadata, StackError, SyncCallable, WrapError,
    };

    pub use heron_combinators::{
        log_calls, memoize, require, require_capability, retry, time_it, Authorize, Combinator,
        Logged, Memoize, Require, Retry, Stack, Timed, WrapExt,
    };

    pub use heron_config::{ConfigLoader, HeronConfig};

    pub use heron_telemetry::{init_logging, LogConfig, MemorySink};
}
