//! Observability for Heron.
//!
//! - **Logging**: `tracing-subscriber` setup for the events combinators emit
//! - **Sinks**: bounded in-memory capture and fan-out for log and timing records
//! - **Metrics**: Prometheus-format call counters and latency histograms via
//!   the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `heron_calls_total` | Counter | `callable`, `outcome` | Completed invocations |
//! | `heron_call_duration_seconds` | Histogram | `callable`, `outcome` | Invocation latency |
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_combinators::{Combinator, Timed};
//! use heron_telemetry::{init_telemetry, MetricsTimingSink, TelemetryConfig};
//!
//! let telemetry = init_telemetry(&TelemetryConfig::default())?;
//! let timed = Timed::new(MetricsTimingSink).wrap_sync(handler);
//! timed.call(args)?;
//!
//! if let Some(registry) = telemetry.metrics() {
//!     println!("{}", registry.render());
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, MetricsConfig, MetricsRegistry, MetricsTimingSink};
pub use sink::{Fanout, MemorySink};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,

    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

impl TelemetryConfig {
    /// Pretty logs at `debug`, metrics enabled.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Handles to the initialized telemetry subsystems.
#[derive(Debug, Clone)]
pub struct Telemetry {
    metrics: Option<MetricsRegistry>,
}

impl Telemetry {
    /// The metrics registry, if metrics were enabled.
    #[must_use]
    pub fn metrics(&self) -> Option<&MetricsRegistry> {
        self.metrics.as_ref()
    }
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<Telemetry> {
    init_logging(&config.logging)?;
    let metrics = init_metrics(&config.metrics)?;
    Ok(Telemetry { metrics })
}
