//! Prometheus metrics for trend refreshes.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Refreshes by outcome (completed, already_running, abandoned)
    pub static ref REFRESH_TOTAL: CounterVec = register_counter_vec!(
        "loadtrend_refresh_total",
        "Trend refreshes by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Refresh duration by outcome (seconds)
    pub static ref REFRESH_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "loadtrend_refresh_duration_seconds",
        "Trend refresh duration in seconds",
        &["outcome"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    /// Build reports seen during aggregation, by status (parsed, missing, malformed)
    pub static ref REPORTS_TOTAL: CounterVec = register_counter_vec!(
        "loadtrend_reports_total",
        "Build reports seen during aggregation by status",
        &["status"]
    )
    .unwrap();

    /// Chart images written, by graph kind (builtin, custom)
    pub static ref CHARTS_WRITTEN_TOTAL: CounterVec = register_counter_vec!(
        "loadtrend_charts_written_total",
        "Chart images written",
        &["kind"]
    )
    .unwrap();
}

/// Encodes every registered metric in the Prometheus text format.
pub fn export_prometheus() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
        });

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to UTF-8: {}", e);
        String::from("# Error encoding metrics\n")
    })
}
