//! Records emitted by the logging and timing combinators, and the sinks that
//! receive them.
//!
//! A sink is anything implementing [`LogSink`] or [`TimingSink`]. Closures
//! taking a record reference qualify, which keeps test sinks short:
//!
//! ```
//! use heron_core::{LogRecord, LogSink, CallId};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let captured = Arc::clone(&seen);
//! let sink = move |record: &LogRecord| captured.lock().unwrap().push(record.phase);
//!
//! sink.emit(&LogRecord::call(CallId::new(), "add", "(1, 2)"));
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Correlates the entry and exit records of a single invocation.
///
/// UUID v7 is time-ordered, so sorting by id also sorts by start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(Uuid);

impl CallId {
    /// Creates a new call id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CallId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Which point of an invocation a log record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Emitted before delegation, with the arguments.
    Call,
    /// Emitted after a successful return, with the result.
    Success,
    /// Emitted after a failure, with the error.
    Failure,
}

impl Phase {
    /// Returns the phase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured log record for one phase of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Shared by the call record and its outcome record.
    pub call_id: CallId,
    /// Name of the logged callable.
    pub callable: String,
    /// Invocation phase.
    pub phase: Phase,
    /// Rendered arguments, present on call records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    /// Rendered result or error, present on outcome records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// When the record was produced.
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Record emitted before delegation.
    #[must_use]
    pub fn call(call_id: CallId, callable: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            call_id,
            callable: callable.into(),
            phase: Phase::Call,
            args: Some(args.into()),
            payload: None,
            timestamp: Utc::now(),
        }
    }

    /// Record emitted after a successful return.
    #[must_use]
    pub fn success(call_id: CallId, callable: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            call_id,
            callable: callable.into(),
            phase: Phase::Success,
            args: None,
            payload: Some(result.into()),
            timestamp: Utc::now(),
        }
    }

    /// Record emitted after a failure.
    #[must_use]
    pub fn failure(call_id: CallId, callable: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id,
            callable: callable.into(),
            phase: Phase::Failure,
            args: None,
            payload: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Elapsed wall-clock time of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRecord {
    /// Name of the timed callable.
    pub callable: String,
    /// Wall-clock time from entry to exit.
    pub elapsed: Duration,
    /// Whether the invocation returned successfully.
    pub succeeded: bool,
    /// When the invocation finished.
    pub finished_at: DateTime<Utc>,
}

impl TimingRecord {
    /// Creates a timing record stamped now.
    #[must_use]
    pub fn new(callable: impl Into<String>, elapsed: Duration, succeeded: bool) -> Self {
        Self {
            callable: callable.into(),
            elapsed,
            succeeded,
            finished_at: Utc::now(),
        }
    }
}

/// Receives structured log records.
pub trait LogSink: Send + Sync {
    /// Handles one record.
    fn emit(&self, record: &LogRecord);
}

impl<F> LogSink for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn emit(&self, record: &LogRecord) {
        self(record);
    }
}

/// Receives timing records.
pub trait TimingSink: Send + Sync {
    /// Handles one record.
    fn record(&self, record: &TimingRecord);
}

impl<F> TimingSink for F
where
    F: Fn(&TimingRecord) + Send + Sync,
{
    fn record(&self, record: &TimingRecord) {
        self(record);
    }
}
