//! Prometheus metrics for the mail store
//!
//! Process-wide counters; per-store counts live in [`crate::dao::StatsSnapshot`].

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Counter: completed store operations (load, insert, update, delete)
    pub static ref STORE_OPERATIONS: IntCounterVec = register_int_counter_vec!(
        "gamemail_store_operations_total",
        "Completed mail store operations by kind",
        &["operation"]
    )
    .expect("Failed to create store_operations metric");

    /// Counter: failed store operations, logged and swallowed at the boundary
    pub static ref STORE_ERRORS: IntCounterVec = register_int_counter_vec!(
        "gamemail_store_errors_total",
        "Failed mail store operations by kind",
        &["operation"]
    )
    .expect("Failed to create store_errors metric");

    /// Counter: identity cache lookups (hit/miss)
    pub static ref CACHE_OPERATIONS: IntCounterVec = register_int_counter_vec!(
        "gamemail_cache_operations_total",
        "Identity cache lookups by result",
        &["result"]
    )
    .expect("Failed to create cache_operations metric");
}

/// Record a completed store operation
pub fn record_operation(operation: &str) {
    STORE_OPERATIONS.with_label_values(&[operation]).inc();
}

/// Record a failed store operation
pub fn record_error(operation: &str) {
    STORE_ERRORS.with_label_values(&[operation]).inc();
}

/// Record cache hit
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

/// Record cache miss
pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> crate::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| crate::GameMailError::Other(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| crate::GameMailError::Other(format!("Metrics are not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = STORE_OPERATIONS.with_label_values(&["insert"]).get();
        record_operation("insert");
        assert!(STORE_OPERATIONS.with_label_values(&["insert"]).get() > before);
    }

    #[test]
    fn test_encode_contains_metric_names() {
        record_cache_hit();
        record_cache_miss();
        record_error("load");
        let text = encode_metrics().unwrap();
        assert!(text.contains("gamemail_cache_operations_total"));
        assert!(text.contains("gamemail_store_errors_total"));
    }
}
