//! Prometheus metrics for the verifier service.
//!
//! Provides metric initialization and helper functions for recording HTTP and submission
//! metrics.

use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics exporter and register metric descriptions.
///
/// Returns a handle that can be used to render metrics for the `/metrics` endpoint.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // HTTP layer metrics
    describe_counter!("zkbridge_http_requests_total", "Total HTTP requests");
    describe_histogram!(
        "zkbridge_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "zkbridge_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Submission metrics
    describe_counter!(
        "zkbridge_submit_total",
        "Total submissions by outcome (admitted, already_processed, rejection reason, error)"
    );
    describe_histogram!(
        "zkbridge_submit_duration_seconds",
        "Submission validation time in seconds"
    );
    describe_gauge!("zkbridge_build_info", "Build information");

    Ok(handle)
}

/// Record an HTTP request start (increment in-flight gauge).
fn record_request_start(endpoint: &str) {
    gauge!("zkbridge_http_requests_in_flight", "endpoint" => endpoint.to_string()).increment(1.0);
}

/// Record an HTTP request completion with status and duration.
fn record_request_end(endpoint: &str, method: &str, status: u16, duration: Duration) {
    gauge!("zkbridge_http_requests_in_flight", "endpoint" => endpoint.to_string()).decrement(1.0);
    counter!(
        "zkbridge_http_requests_total",
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "zkbridge_http_request_duration_seconds",
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a submission outcome.
pub(crate) fn record_submit(outcome: &'static str, duration: Duration) {
    counter!("zkbridge_submit_total", "outcome" => outcome).increment(1);
    histogram!("zkbridge_submit_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());
}

/// Set the build info gauge with version label.
pub fn set_build_info(version: &str) {
    gauge!("zkbridge_build_info", "version" => version.to_string()).set(1.0);
}

/// Axum middleware that records HTTP request metrics.
///
/// Requests are labelled by route template so `/deposits/{deposit_id}` is a single series.
pub(crate) async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    };

    record_request_start(&path);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    record_request_end(&path, &method, status, start.elapsed());

    response
}
