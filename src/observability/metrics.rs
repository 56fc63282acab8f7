//! Metrics collection.
//!
//! # Metrics
//! - `runtime_events_emitted_total` (counter): emits, labelled `matched`
//! - `runtime_handlers_invoked_total` (counter): handler invocations
//! - `runtime_dispatch_total` (counter): dispatched commands by unit
//! - `runtime_hook_failures_total` (counter): failed hooks by point
//!
//! # Design Decisions
//! - Labels stay low-cardinality: no paths or parameter values

use crate::hooks::HookPoint;

/// Record an emit, whether or not a route matched.
pub fn record_emit(matched: bool) {
    metrics::counter!(
        "runtime_events_emitted_total",
        "matched" => if matched { "true" } else { "false" }
    )
    .increment(1);
}

/// Record handler invocations for one emit.
pub fn record_handlers_invoked(count: usize) {
    if count > 0 {
        metrics::counter!("runtime_handlers_invoked_total").increment(count as u64);
    }
}

/// Record a dispatched command.
pub fn record_dispatch(unit: &str) {
    metrics::counter!("runtime_dispatch_total", "unit" => unit.to_string()).increment(1);
}

/// Record a failed hook.
pub fn record_hook_failure(point: HookPoint) {
    metrics::counter!("runtime_hook_failures_total", "point" => point.to_string()).increment(1);
}
