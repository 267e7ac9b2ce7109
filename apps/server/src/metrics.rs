//! Prometheus metrics for the catalog server

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Histogram, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "catalog_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "catalog_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // Listing Metrics

    /// Listing requests by mode (ranked/unranked) and outcome
    pub static ref LISTING_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_listing_requests_total",
        "Total number of catalog listing requests",
        &["mode", "status"]
    )
    .expect("Failed to register LISTING_REQUESTS_TOTAL");

    pub static ref LISTING_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "catalog_listing_duration_seconds",
        "Catalog listing duration in seconds",
        &["mode"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register LISTING_DURATION_SECONDS");

    /// Records materialized for distance ranking
    pub static ref LISTING_CANDIDATES: Histogram = register_histogram!(
        "catalog_listing_candidates",
        "Number of records materialized for distance ranking",
        vec![0.0, 10.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0]
    )
    .expect("Failed to register LISTING_CANDIDATES");

    // Database Metrics

    pub static ref DB_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        "catalog_db_connections_active",
        "Number of active database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_ACTIVE");

    pub static ref DB_CONNECTIONS_IDLE: IntGauge = register_int_gauge!(
        "catalog_db_connections_idle",
        "Number of idle database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_IDLE");
}

/// Collapse id segments so path labels keep a bounded cardinality.
pub fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out = String::with_capacity(path.len());
    for (i, segment) in segments.iter().enumerate() {
        out.push('/');
        // /api/v1/pharmacies/:pharmacy_id/medicines
        if i > 0 && segments[i - 1] == "pharmacies" {
            out.push_str("{id}");
        } else {
            out.push_str(segment);
        }
    }
    out
}
