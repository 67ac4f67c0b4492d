//! # Heron Core
//!
//! Core types shared by every Heron combinator.
//!
//! This crate provides the foundational types of the combinator family:
//!
//! - [`SyncCallable`], [`AsyncCallable`], [`AnyCallable`] - The callable model and its two calling contracts
//! - [`Metadata`] - Callable identity republished by every wrapper
//! - [`WrapError`] - Failures raised by wrappers themselves
//! - [`CacheKey`] - Canonical argument keys for memoization
//! - [`AuthContext`] - Caller identity and capabilities
//! - [`CancelToken`] - Cooperative cancellation for retry loops
//! - [`EvictionPolicy`], [`BackoffPolicy`], [`Classification`] - Policy values
//! - [`LogRecord`], [`TimingRecord`] - Records delivered to sinks

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod auth;
mod callable;
mod cancel;
mod error;
mod key;
mod metadata;
mod policy;
mod record;

pub use auth::{AuthContext, CarriesAuthContext};
pub use callable::{AnyCallable, AsyncCallable, BoxFuture, Contract, SyncCallable};
pub use cancel::CancelToken;
pub use error::{StackError, WrapError};
pub use key::CacheKey;
pub use metadata::{copy_metadata, Described, Metadata, Param};
pub use policy::{always_retry, never_retry, BackoffPolicy, Classification, EvictionPolicy};
pub use record::{CallId, LogRecord, LogSink, Phase, TimingRecord, TimingSink};
