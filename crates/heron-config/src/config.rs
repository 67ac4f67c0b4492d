//! Top-level configuration.

use serde::{Deserialize, Serialize};

use crate::{CacheConfig, ConfigError, LogFormat, LoggingConfig, MetricsSection, RetryConfig};
use heron_core::EvictionPolicy;
use heron_telemetry::TelemetryConfig;

/// Combinator defaults and telemetry settings for a Heron application.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.retry.max_attempts, 3);
/// assert_eq!(config.cache.capacity, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Retry defaults.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Memoization defaults.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging subscriber settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics recorder settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl HeronConfig {
    /// Verbose pretty logs, short delays, small caches.
    #[must_use]
    pub fn development() -> Self {
        Self {
            retry: RetryConfig {
                max_attempts: 2,
                base_delay_ms: 10,
                ..RetryConfig::default()
            },
            cache: CacheConfig {
                capacity: 128,
                ..CacheConfig::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..LoggingConfig::default()
            },
            metrics: MetricsSection::default(),
        }
    }

    /// JSON logs at `info` with a capped backoff.
    #[must_use]
    pub fn production() -> Self {
        Self {
            retry: RetryConfig {
                max_attempts: 5,
                max_delay_ms: Some(30_000),
                ..RetryConfig::default()
            },
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsSection::default(),
        }
    }

    /// Telemetry settings derived from the logging and metrics sections.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: self.logging.log_config(),
            metrics: self.metrics.metrics_config(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `retry.max_attempts` is zero
    /// - `retry.multiplier` is below 1 or not finite
    /// - `retry.max_delay_ms` is below `retry.base_delay_ms`
    /// - an LRU cache has zero capacity
    /// - a TTL cache has a zero lifetime
    /// - the log level is not a valid filter directive
    /// - histogram buckets are not strictly increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid_value(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }

        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigError::invalid_value(
                "retry.multiplier",
                format!("must be a finite number >= 1.0, got {}", self.retry.multiplier),
            ));
        }

        if let Some(max) = self.retry.max_delay_ms {
            if max < self.retry.base_delay_ms {
                return Err(ConfigError::invalid_value(
                    "retry.max_delay_ms",
                    "must not be below retry.base_delay_ms",
                ));
            }
        }

        match self.cache.eviction_policy() {
            EvictionPolicy::Lru { capacity: 0 } => {
                return Err(ConfigError::invalid_value("cache.capacity", "must be at least 1"));
            }
            EvictionPolicy::Ttl { ttl, .. } if ttl.is_zero() => {
                return Err(ConfigError::invalid_value("cache.ttl_secs", "must be positive"));
            }
            _ => {}
        }

        if self.logging.enabled {
            heron_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        if !self
            .metrics
            .histogram_buckets
            .windows(2)
            .all(|pair| pair[0] < pair[1])
        {
            return Err(ConfigError::invalid_value(
                "metrics.histogram_buckets",
                "must be strictly increasing",
            ));
        }

        Ok(())
    }
}
