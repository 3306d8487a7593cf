//! Metrics recording for gateway operations.

use std::time::Instant;

/// Records operation metrics for a gateway call.
///
/// This function records two metrics for each operation:
/// 1. `storage_operations_total` - Counter for operation count by status
/// 2. `storage_operation_duration_ms` - Histogram for operation latency
///
/// # Arguments
///
/// * `backend` - Backend name (e.g., "sqlite")
/// * `operation` - Operation name (e.g., "get_all", "add", "remove_site_cascade")
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - Operation status ("success" or "error")
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Runs `f`, recording its outcome under `operation`.
pub fn timed<T, E>(
    operation: &'static str,
    f: impl FnOnce() -> std::result::Result<T, E>,
) -> std::result::Result<T, E> {
    let start = Instant::now();
    let result = f();
    let status = if result.is_ok() { "success" } else { "error" };
    record_operation_metrics("sqlite", operation, start, status);
    result
}
