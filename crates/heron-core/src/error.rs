//! Error types for Heron.
//!
//! Wrappers never change the failure type of the callable they wrap. Failures
//! raised by a wrapper itself are [`WrapError`] values that enter the
//! callable's error type through `From<WrapError>`:
//!
//! ```
//! use heron_core::WrapError;
//! use thiserror::Error;
//!
//! #[derive(Debug, Error)]
//! enum HandlerError {
//!     #[error("storage unavailable")]
//!     Storage,
//!     #[error(transparent)]
//!     Wrap(#[from] WrapError),
//! }
//!
//! let err: HandlerError = WrapError::precondition("create_post", "title is required").into();
//! assert!(matches!(err, HandlerError::Wrap(WrapError::PreconditionViolation { .. })));
//! ```
//!
//! | Variant | Raised by | Wrapped callable invoked? |
//! |---|---|---|
//! | `PreconditionViolation` | validation guard | never |
//! | `Forbidden` | authorization guard | never |
//! | `UnhashableArgument` | memoization | never |
//! | `Cancelled` | retry controller | not again after cancellation |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised by wrappers themselves, as opposed to pass-through
/// failures of the wrapped callable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WrapError {
    /// The validation guard rejected the arguments.
    #[error("precondition violated for {callable}: {message}")]
    PreconditionViolation {
        /// Name of the guarded callable.
        callable: String,
        /// Message supplied with the predicate.
        message: String,
    },

    /// The authorization guard denied the caller.
    #[error("forbidden: {caller} may not call {callable}: {reason}")]
    Forbidden {
        /// Name of the guarded callable.
        callable: String,
        /// Identity of the denied caller.
        caller: String,
        /// Why the caller was denied.
        reason: String,
    },

    /// Memoization could not canonicalize the arguments into a cache key.
    #[error("unhashable argument for {callable}: {reason}")]
    UnhashableArgument {
        /// Name of the memoized callable.
        callable: String,
        /// Why canonicalization failed.
        reason: String,
    },

    /// The retry controller was cancelled by its caller.
    #[error("{callable} cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Name of the retried callable.
        callable: String,
        /// Attempts made before cancellation.
        attempts: u32,
    },
}

impl WrapError {
    /// Creates a precondition violation.
    #[must_use]
    pub fn precondition(callable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            callable: callable.into(),
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(
        callable: impl Into<String>,
        caller: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Forbidden {
            callable: callable.into(),
            caller: caller.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unhashable argument error.
    #[must_use]
    pub fn unhashable(callable: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnhashableArgument {
            callable: callable.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(callable: impl Into<String>, attempts: u32) -> Self {
        Self::Cancelled {
            callable: callable.into(),
            attempts,
        }
    }

    /// Returns the name of the callable the error was raised for.
    #[must_use]
    pub fn callable(&self) -> &str {
        match self {
            Self::PreconditionViolation { callable, .. }
            | Self::Forbidden { callable, .. }
            | Self::UnhashableArgument { callable, .. }
            | Self::Cancelled { callable, .. } => callable,
        }
    }

    /// Whether a guard rejected the call before delegation.
    #[must_use]
    pub const fn is_guard_rejection(&self) -> bool {
        matches!(
            self,
            Self::PreconditionViolation { .. } | Self::Forbidden { .. }
        )
    }
}

/// Errors raised while assembling a combinator stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// A retry layer would wrap a memoization layer.
    ///
    /// Memoization must sit outside retry so that only a finally-successful
    /// result is cached.
    #[error(
        "retry layer #{retry_layer} would wrap memoization layer #{memoize_layer}; apply retry first"
    )]
    RetryOutsideMemoize {
        /// Position of the retry layer in application order.
        retry_layer: usize,
        /// Position of the memoization layer in application order.
        memoize_layer: usize,
    },
}
