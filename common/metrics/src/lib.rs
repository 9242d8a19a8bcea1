//! A wrapper around the `prometheus` crate that provides a global metrics registry
//! and functions to register and use `IntGauge` metrics against it.
//!
//! ## Important
//!
//! Metrics will fail if two items have the same `name`. All metrics must have a unique `name`.
//! Because we use a global registry there is no namespace per crate, it's one big global space.
//!
//! See the [Prometheus naming best practices](https://prometheus.io/docs/practices/naming/) when
//! choosing metric names.

use prometheus::Opts;

pub use prometheus::{Encoder, IntGauge, Result, TextEncoder};

/// Collect all the metrics for reporting.
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    prometheus::gather()
}

/// Attempts to create an `IntGauge`, returning `Err` if the registry does not accept the gauge
/// (potentially due to naming conflict).
pub fn try_create_int_gauge(name: &str, help: &str) -> Result<IntGauge> {
    let opts = Opts::new(name, help);
    let gauge = IntGauge::with_opts(opts)?;
    prometheus::register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// If `int_gauge.is_ok()`, sets the gauge, otherwise does nothing.
pub fn set_gauge(int_gauge: &Result<IntGauge>, value: i64) {
    if let Ok(int_gauge) = int_gauge {
        int_gauge.set(value);
    }
}
