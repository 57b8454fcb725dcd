//! Prometheus metrics for the relayer.

use anyhow::Context;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics exporter and register metric descriptions.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(
        "zkbridge_relayer_dispatch_total",
        "Deposits pulled from the feed by dispatch outcome"
    );
    describe_gauge!(
        "zkbridge_relayer_in_flight",
        "Number of submissions currently in flight"
    );

    Ok(handle)
}

/// Record the outcome of one tick's dispatch.
pub(crate) fn record_dispatch(outcome: &'static str) {
    counter!("zkbridge_relayer_dispatch_total", "outcome" => outcome).increment(1);
}

/// Set the number of in-flight submissions.
pub(crate) fn set_in_flight(count: usize) {
    gauge!("zkbridge_relayer_in_flight").set(count as f64);
}

/// Router exposing `/health` and `/metrics`.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(StatusCode::OK))
        .route("/metrics", get(get_metrics))
        .with_state(handle)
}

async fn get_metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
