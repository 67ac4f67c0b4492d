//! Typed configuration for Heron.
//!
//! Holds the defaults applications feed into combinators (retry attempts and
//! backoff, memoization policy) and the telemetry settings, with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//! use heron_core::always_retry;
//!
//! # fn main() -> Result<(), heron_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .with_optional_file("heron.toml")?
//!     .with_env_prefix("HERON")
//!     .load()?;
//!
//! let retry = config.retry.retry::<std::io::Error, _>(always_retry);
//! let memo = config.cache.memoize::<String>();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 100
//! multiplier = 2.0
//! max_delay_ms = 10000
//!
//! [cache]
//! policy = "lru"        # "unbounded" | "lru" | "ttl"
//! capacity = 1024
//! ttl_secs = 300
//! coalesce = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"       # "json" | "pretty"
//!
//! [metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `HERON__RETRY__MAX_ATTEMPTS=5`
//! - `HERON__CACHE__POLICY=ttl`
//! - `HERON__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HeronConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    CacheConfig, CachePolicyKind, LogFormat, LoggingConfig, MetricsSection, RetryConfig,
};
