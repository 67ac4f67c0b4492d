//! Prometheus metrics for wrapped callables.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `heron_calls_total` | Counter | `callable`, `outcome` | Completed invocations |
//! | `heron_call_duration_seconds` | Histogram | `callable`, `outcome` | Invocation latency |
//!
//! Both are fed by [`MetricsTimingSink`], a [`TimingSink`] that plugs into the
//! timing combinator. Without an installed recorder the `metrics` facade
//! drops the observations.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use heron_core::{TimingRecord, TimingSink};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Counter of completed invocations.
pub const CALLS_TOTAL: &str = "heron_calls_total";

/// Histogram of invocation latency in seconds.
pub const CALL_DURATION_SECONDS: &str = "heron_call_duration_seconds";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for call duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 100us .. 10s
            duration_buckets: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                10.0,
            ],
        }
    }
}

/// Handle for rendering collected metrics.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Wraps a Prometheus handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

fn builder(config: &MetricsConfig) -> TelemetryResult<PrometheusBuilder> {
    if config.duration_buckets.is_empty() {
        return Ok(PrometheusBuilder::new());
    }
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(CALL_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))
}

/// Installs the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a global recorder is already
/// installed, or `TelemetryError::InvalidConfig` for unusable buckets.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = builder(config)?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle.clone());
    register_metric_descriptions();

    Ok(Some(MetricsRegistry::new(handle)))
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the standard metrics.
pub fn register_metric_descriptions() {
    describe_counter!(CALLS_TOTAL, "Completed invocations of wrapped callables");
    describe_histogram!(
        CALL_DURATION_SECONDS,
        Unit::Seconds,
        "Wall-clock duration of wrapped callable invocations"
    );
}

/// Records one completed invocation.
pub fn record_call(record: &TimingRecord) {
    let outcome = if record.succeeded { "success" } else { "failure" };

    counter!(
        CALLS_TOTAL,
        "callable" => record.callable.clone(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        CALL_DURATION_SECONDS,
        "callable" => record.callable.clone(),
        "outcome" => outcome
    )
    .record(record.elapsed.as_secs_f64());
}

/// A [`TimingSink`] that turns timing records into metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsTimingSink;

impl TimingSink for MetricsTimingSink {
    fn record(&self, record: &TimingRecord) {
        record_call(record);
    }
}
