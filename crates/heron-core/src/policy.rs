//! Eviction, backoff, and failure classification policies.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a memoization cache bounds its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep every entry for the lifetime of the wrapper.
    #[default]
    Unbounded,
    /// Keep at most `capacity` entries, evicting the least recently used.
    ///
    /// A capacity of zero retains nothing: every call recomputes.
    Lru {
        /// Maximum number of retained entries.
        capacity: usize,
    },
    /// Entries expire `ttl` after insertion. An optional capacity bounds the
    /// cache with LRU eviction on top of expiry.
    Ttl {
        /// Lifetime of an entry.
        #[serde(with = "duration_ms")]
        ttl: Duration,
        /// Optional entry limit.
        #[serde(default)]
        capacity: Option<usize>,
    },
}

impl EvictionPolicy {
    /// LRU policy with the given capacity.
    #[must_use]
    pub const fn lru(capacity: usize) -> Self {
        Self::Lru { capacity }
    }

    /// TTL policy without a capacity bound.
    #[must_use]
    pub const fn ttl(ttl: Duration) -> Self {
        Self::Ttl {
            ttl,
            capacity: None,
        }
    }

    /// Entry limit, if the policy has one.
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Lru { capacity } => Some(*capacity),
            Self::Ttl { capacity, .. } => *capacity,
        }
    }

    /// Entry lifetime, if the policy has one.
    #[must_use]
    pub const fn time_to_live(&self) -> Option<Duration> {
        match self {
            Self::Ttl { ttl, .. } => Some(*ttl),
            _ => None,
        }
    }
}

/// Delay schedule between retry attempts.
///
/// The delay before attempt `n + 1` (after `n` failures) is
/// `base_delay * multiplier^(n - 1)`, capped at `max_delay` when set. A
/// multiplier of `1.0` gives a constant delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    #[serde(with = "duration_ms")]
    pub base_delay: Duration,
    /// Growth factor per subsequent failure.
    pub multiplier: f64,
    /// Ceiling on any single delay.
    #[serde(default, with = "opt_duration_ms")]
    pub max_delay: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::exponential(Duration::from_millis(100))
    }
}

impl BackoffPolicy {
    /// Doubling backoff starting at `base_delay`.
    #[must_use]
    pub const fn exponential(base_delay: Duration) -> Self {
        Self {
            base_delay,
            multiplier: 2.0,
            max_delay: None,
        }
    }

    /// The same delay between every attempt.
    #[must_use]
    pub const fn constant(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            multiplier: 1.0,
            max_delay: None,
        }
    }

    /// Sets the growth factor.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the delay ceiling.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Delay to wait after the `failures`-th consecutive failure.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures == 0 || self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(failures - 1).unwrap_or(i32::MAX);
        let factor = self.multiplier.max(0.0).powi(exponent);
        let ceiling = self.max_delay.unwrap_or(Duration::MAX);
        Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
            .map_or(ceiling, |delay| delay.min(ceiling))
    }
}

/// Whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Try again after the backoff delay.
    Retryable,
    /// Stop and return the failure.
    Fatal,
}

impl Classification {
    /// Whether the failure should be retried.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Retryable)
    }
}

/// Classifier treating every failure as retryable.
pub fn always_retry<E>(_: &E) -> Classification {
    Classification::Retryable
}

/// Classifier treating every failure as fatal.
pub fn never_retry<E>(_: &E) -> Classification {
    Classification::Fatal
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}
