//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use crate::notification::{FallbackReason, TransportKind};
use crate::transport::CircuitState;

use super::{
    ABSENCE_SCAN_NOTIFIED_TOTAL, CIRCUIT_BREAKER_STATE, DISPATCH_TOTAL, EVENTS_TOTAL,
    FALLBACK_TOTAL, MOCK_FORCED, MOCK_INJECTED_FAILURES_TOTAL, REAL_TRANSPORT_LATENCY,
    SEND_LOG_SIZE,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

fn result_label(succeeded: bool) -> &'static str {
    if succeeded {
        "success"
    } else {
        "failure"
    }
}

/// Helper struct for recording dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Record the final outcome of one dispatch
    pub fn record_dispatch(transport: TransportKind, succeeded: bool) {
        DISPATCH_TOTAL
            .with_label_values(&[transport.as_str(), result_label(succeeded)])
            .inc();
    }

    /// Record a fallback from real to mock
    pub fn record_fallback(reason: &FallbackReason) {
        FALLBACK_TOTAL.with_label_values(&[reason.label()]).inc();
    }

    pub fn record_mock_injected_failure() {
        MOCK_INJECTED_FAILURES_TOTAL.inc();
    }

    pub fn set_log_size(size: usize) {
        SEND_LOG_SIZE.set(size as i64);
    }

    pub fn set_mock_forced(forced: bool) {
        MOCK_FORCED.set(i64::from(forced));
    }

    pub fn observe_real_latency(elapsed: Duration) {
        REAL_TRANSPORT_LATENCY.observe(elapsed.as_secs_f64());
    }

    pub fn set_circuit_state(state: CircuitState) {
        CIRCUIT_BREAKER_STATE.set(state.as_gauge());
    }
}

/// Helper struct for recording domain event metrics
pub struct EventMetrics;

impl EventMetrics {
    pub fn record_event(event: &str, succeeded: bool) {
        EVENTS_TOTAL
            .with_label_values(&[event, result_label(succeeded)])
            .inc();
    }

    pub fn record_absences_notified(count: usize) {
        ABSENCE_SCAN_NOTIFIED_TOTAL.inc_by(count as u64);
    }
}
