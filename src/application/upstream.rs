//! Bookkeeping shared by every upstream call.

use std::time::Instant;

use metrics::{counter, histogram};

pub(crate) const METRIC_UPSTREAM_CALLS: &str = "trendpress_upstream_calls_total";
pub(crate) const METRIC_UPSTREAM_MS: &str = "trendpress_upstream_call_ms";

/// Record outcome and latency for one upstream call.
pub(crate) fn observe<T, E>(operation: &'static str, started_at: Instant, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    counter!(METRIC_UPSTREAM_CALLS, "operation" => operation, "outcome" => outcome).increment(1);
    histogram!(METRIC_UPSTREAM_MS, "operation" => operation)
        .record(started_at.elapsed().as_secs_f64() * 1000.0);
}
