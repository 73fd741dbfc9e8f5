//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Lumière upload server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - WebSocket connection metrics
//! - Upload pipeline metrics (intake, transfers, submissions)
//! - Session and entry gauges (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lumiere_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lumiere_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lumiere_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lumiere_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lumiere_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by event type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lumiere_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lumiere_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Upload Pipeline Metrics
// =============================================================================

/// Sessions created total.
pub static SESSIONS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lumiere_sessions_created_total",
        "Total upload sessions created since startup",
    )
    .unwrap()
});

/// Live sessions (collected dynamically).
pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("lumiere_sessions_active", "Number of live upload sessions").unwrap()
});

/// Entries by current status across all sessions (collected dynamically).
pub static ENTRIES_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "lumiere_entries_by_status",
            "Current entry count by transfer status",
        ),
        &["status"],
    )
    .unwrap()
});

/// Files accepted at intake.
pub static FILES_ACCEPTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lumiere_files_accepted_total",
        "Total files accepted at intake",
    )
    .unwrap()
});

/// Files rejected at intake, by reason.
pub static FILES_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lumiere_files_rejected_total",
            "Total files rejected at intake",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Finished transfers, by outcome.
pub static TRANSFERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lumiere_transfers_total", "Finished transfers by outcome"),
        &["outcome"],
    )
    .unwrap()
});

/// Submission runs finished.
pub static SUBMISSIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lumiere_submissions_total",
        "Total submission runs finished",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Pipeline
    registry
        .register(Box::new(SESSIONS_CREATED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(SESSIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(ENTRIES_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(FILES_ACCEPTED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(FILES_REJECTED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TRANSFERS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(SUBMISSIONS_TOTAL.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic gauges from current application state.
///
/// Called before encoding so session and entry gauges reflect the live
/// registry rather than the last mutation.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    SESSIONS_ACTIVE.set(state.session_count().await as i64);

    let stats = state.aggregate_stats().await;
    ENTRIES_BY_STATUS
        .with_label_values(&["pending"])
        .set(stats.pending as i64);
    ENTRIES_BY_STATUS
        .with_label_values(&["uploading"])
        .set(stats.uploading as i64);
    ENTRIES_BY_STATUS
        .with_label_values(&["success"])
        .set(stats.succeeded as i64);
    ENTRIES_BY_STATUS
        .with_label_values(&["error"])
        .set(stats.failed as i64);
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}
