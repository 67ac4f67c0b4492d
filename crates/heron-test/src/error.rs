//! Test error type.

use heron_core::{Classification, WrapError};
use thiserror::Error;

/// Failure type for test callables.
///
/// [`TestError::Transient`] is the only retryable variant under
/// [`TestError::classify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestError {
    /// A failure that may go away on retry.
    #[error("transient failure")]
    Transient,

    /// A failure that will not go away.
    #[error("permanent failure: {0}")]
    Permanent(String),

    /// A failure raised by a wrapper.
    #[error(transparent)]
    Wrap(#[from] WrapError),
}

impl TestError {
    /// Classifies transient failures as retryable and everything else as
    /// fatal.
    #[must_use]
    pub fn classify(err: &Self) -> Classification {
        match err {
            Self::Transient => Classification::Retryable,
            Self::Permanent(_) | Self::Wrap(_) => Classification::Fatal,
        }
    }
}
