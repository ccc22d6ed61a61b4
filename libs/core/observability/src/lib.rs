//! Observability utilities for the products service.
//!
//! - Prometheus recorder installation and `/metrics` rendering
//! - Query metrics (operation counts, latency, rejections, result sizes)
//! - Axum middleware for per-route request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, QueryMetrics};
//!
//! init_metrics()?;
//!
//! QueryMetrics::record_rejection("unknown_operator");
//!
//! let app = Router::new().route("/metrics", get(metrics_handler));
//! ```

pub mod middleware;
pub mod queries;

pub use middleware::metrics_middleware;
pub use queries::{QueryMetrics, QueryTimer};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder.
///
/// Safe to call more than once; later calls return the first handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();
        Ok(handle)
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Product store metrics
    describe_counter!(
        "product_queries_total",
        "Product queries by operation and outcome"
    );
    describe_histogram!(
        "product_query_duration_seconds",
        "Product query duration in seconds"
    );
    describe_histogram!(
        "product_query_results",
        "Number of documents returned per read"
    );
    describe_counter!(
        "product_query_rejections_total",
        "Queries rejected before reaching the store, by reason"
    );
}
