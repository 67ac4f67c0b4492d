//! # Heron Test
//!
//! Test utilities for code built on Heron combinators.
//!
//! ## Key Features
//!
//! - **Call counting**: [`CallCounter`] observes how many times a body ran
//! - **Flaky callables**: [`flaky_sync`] and [`flaky_async`] fail a fixed
//!   number of times before succeeding
//! - **Recording sinks**: [`RecordingSink`] captures log and timing records
//! - **A ready-made error type**: [`TestError`] with a retry classifier
//!
//! ## Example
//!
//! ```
//! use heron_test::{flaky_sync, CallCounter, TestError};
//!
//! let counter = CallCounter::new();
//! let fetch = flaky_sync("fetch", &counter, 1, "payload");
//!
//! assert_eq!(fetch.call(()), Err(TestError::Transient));
//! assert_eq!(fetch.call(()), Ok("payload"));
//! assert_eq!(counter.count(), 2);
//! ```

#![doc(html_root_url = "https://docs.rs/heron-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod callables;
mod counter;
mod error;
mod sink;

pub use callables::{always_failing, counting, flaky_async, flaky_sync, sleeping};
pub use counter::CallCounter;
pub use error::TestError;
pub use sink::RecordingSink;
