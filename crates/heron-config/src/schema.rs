//! Configuration schema types.
//!
//! Each section converts into the type its combinator or subsystem consumes.

use heron_combinators::{Memoize, Retry};
use heron_core::{BackoffPolicy, Classification, EvictionPolicy};
use heron_telemetry::{LogConfig, MetricsConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry defaults.
///
/// # Example
///
/// ```
/// use heron_config::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default();
/// let backoff = config.backoff();
/// assert_eq!(backoff.delay_for(1), Duration::from_millis(100));
/// assert_eq!(backoff.delay_for(3), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per invocation, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Growth factor applied per failure.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Ceiling on any single delay, in milliseconds.
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: None,
        }
    }
}

impl RetryConfig {
    /// The configured backoff schedule.
    #[must_use]
    pub fn backoff(&self) -> BackoffPolicy {
        let policy = BackoffPolicy::exponential(Duration::from_millis(self.base_delay_ms))
            .with_multiplier(self.multiplier);
        match self.max_delay_ms {
            Some(ms) => policy.with_max_delay(Duration::from_millis(ms)),
            None => policy,
        }
    }

    /// A retry combinator using these defaults and the given classifier.
    pub fn retry<E, C>(&self, classify: C) -> Retry<E>
    where
        C: Fn(&E) -> Classification + Send + Sync + 'static,
    {
        Retry::new(self.max_attempts, self.backoff(), classify)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_multiplier() -> f64 {
    2.0
}

/// Eviction policy selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicyKind {
    /// Keep every entry.
    Unbounded,
    /// Bounded, least recently used evicted first.
    #[default]
    Lru,
    /// Entries expire after `ttl_secs`, bounded by `capacity`.
    Ttl,
}

/// Memoization defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Eviction policy.
    #[serde(default)]
    pub policy: CachePolicyKind,

    /// Entry limit for `lru` and `ttl`.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Entry lifetime for `ttl`, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Whether concurrent misses on one key share a single computation.
    #[serde(default = "default_true")]
    pub coalesce: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicyKind::default(),
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
            coalesce: true,
        }
    }
}

impl CacheConfig {
    /// The configured eviction policy.
    ///
    /// ```
    /// use heron_config::{CacheConfig, CachePolicyKind};
    /// use heron_core::EvictionPolicy;
    ///
    /// let config = CacheConfig { policy: CachePolicyKind::Lru, capacity: 64, ..Default::default() };
    /// assert_eq!(config.eviction_policy(), EvictionPolicy::lru(64));
    /// ```
    #[must_use]
    pub const fn eviction_policy(&self) -> EvictionPolicy {
        match self.policy {
            CachePolicyKind::Unbounded => EvictionPolicy::Unbounded,
            CachePolicyKind::Lru => EvictionPolicy::lru(self.capacity),
            CachePolicyKind::Ttl => EvictionPolicy::Ttl {
                ttl: Duration::from_secs(self.ttl_secs),
                capacity: Some(self.capacity),
            },
        }
    }

    /// A memoization combinator using these defaults.
    #[must_use]
    pub fn memoize<T>(&self) -> Memoize<T>
    where
        T: Clone + Send + 'static,
    {
        Memoize::new(self.eviction_policy()).coalesce(self.coalesce)
    }
}

fn default_capacity() -> usize {
    1024
}

fn default_ttl_secs() -> u64 {
    300
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable the logging subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    /// The subscriber settings for this section.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            ..base.with_level(self.level.clone())
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram bucket boundaries for call duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

impl MetricsSection {
    /// The recorder settings for this section.
    #[must_use]
    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            duration_buckets: self.histogram_buckets.clone(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}

fn default_true() -> bool {
    true
}
