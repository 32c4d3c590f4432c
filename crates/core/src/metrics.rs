//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Executor (conversion runs and their duration)
//! - History ledger (appends)
//! - Session state machine (ignored transitions, idle evictions)
//! - Audit writer (stored and failed writes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Executor Metrics
// =============================================================================

/// Conversion runs total by category and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("formatshift_conversions_total", "Total conversion runs"),
        &["category", "result"], // result: "completed", "failed", "discarded"
    )
    .unwrap()
});

/// Conversion duration in seconds, measured around the converter call.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "formatshift_conversion_duration_seconds",
            "Duration of converter calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["category"],
    )
    .unwrap()
});

/// Uploaded payload sizes in bytes.
pub static PAYLOAD_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "formatshift_payload_bytes",
            "Size of payloads submitted for conversion",
        )
        .buckets(prometheus::exponential_buckets(1024.0, 4.0, 10).unwrap()),
        &["category"],
    )
    .unwrap()
});

// =============================================================================
// History Metrics
// =============================================================================

/// Records appended to the history ledger.
pub static HISTORY_APPENDS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "formatshift_history_appends_total",
        "Total records appended to the history ledger",
    )
    .unwrap()
});

// =============================================================================
// Session Metrics
// =============================================================================

/// Triggers that were dropped because their guard failed or their run token was stale.
pub static IGNORED_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "formatshift_ignored_transitions_total",
            "Total session triggers ignored by the state machine",
        ),
        &["trigger"], // "start", "upload_complete", "complete", "fail"
    )
    .unwrap()
});

/// Sessions dropped by the idle sweep.
pub static SESSIONS_EXPIRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "formatshift_sessions_expired_total",
        "Total idle sessions evicted from the registry",
    )
    .unwrap()
});

// =============================================================================
// Audit Metrics
// =============================================================================

/// Audit writes by result.
pub static AUDIT_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "formatshift_audit_writes_total",
            "Total audit events handled by the writer",
        ),
        &["result"], // "stored", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Executor
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(PAYLOAD_BYTES.clone()),
        // History
        Box::new(HISTORY_APPENDS.clone()),
        // Session
        Box::new(IGNORED_TRANSITIONS.clone()),
        Box::new(SESSIONS_EXPIRED.clone()),
        // Audit
        Box::new(AUDIT_WRITES.clone()),
    ]
}
