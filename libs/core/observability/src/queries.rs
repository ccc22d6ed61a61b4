//! Metrics for product store operations and query translation.

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Product query metrics recorder
pub struct QueryMetrics;

impl QueryMetrics {
    /// Count one store operation and record its latency.
    pub fn record_operation(operation: &'static str, outcome: &'static str, duration: Duration) {
        counter!(
            "product_queries_total",
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
        histogram!("product_query_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());

        tracing::debug!(
            operation = operation,
            outcome = outcome,
            duration_ms = duration.as_millis() as u64,
            "Product operation finished"
        );
    }

    /// Record how many documents a read returned.
    pub fn record_result_size(operation: &'static str, count: usize) {
        histogram!("product_query_results", "operation" => operation).record(count as f64);
    }

    /// Count a filter, sort or projection rejected during translation.
    pub fn record_rejection(reason: &'static str) {
        counter!("product_query_rejections_total", "reason" => reason).increment(1);
    }
}

/// Measures one operation from creation to [`finish`](Self::finish).
pub struct QueryTimer {
    operation: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn finish(self, outcome: &'static str) {
        QueryMetrics::record_operation(self.operation, outcome, self.start.elapsed());
    }
}
