//! Application state and HTTP endpoints.

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::{
    Verifier,
    app::{deposit::get_deposit_status, submit::submit_deposit},
    metrics::http_metrics_middleware,
};

mod deposit;
mod submit;

/// Submissions carry a witness, a signature and at most a small recursive proof.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validation pipeline and processed set.
    pub(crate) verifier: Arc<Verifier>,
    /// Prometheus metrics handle for rendering metrics.
    pub(crate) metrics: PrometheusHandle,
}

impl AppState {
    /// Creates the application state.
    pub fn new(verifier: Arc<Verifier>, metrics: PrometheusHandle) -> Self {
        Self { verifier, metrics }
    }
}

/// Builds the Axum router with all endpoints and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/submit", post(submit_deposit))
        .route("/deposits/{deposit_id}", get(get_deposit_status))
        .route("/health", get(StatusCode::OK))
        .route("/metrics", get(get_metrics))
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// HTTP handler for the `/metrics` endpoint.
async fn get_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use metrics_exporter_prometheus::PrometheusBuilder;
    use zkbridge_signer::{SignerConfig, SigningKey};

    use crate::{AppState, MemoryProcessedSet, Verifier};

    pub(crate) fn signing_key() -> SigningKey {
        SigningKey::from_config(&SignerConfig::MockSig {
            key: "demo-relayer-key".to_string(),
        })
        .unwrap()
    }

    pub(crate) fn mock_app_state() -> AppState {
        let verifier = Verifier::new(Arc::new(MemoryProcessedSet::new()))
            .with_scheme(signing_key().verifying_key());
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState::new(Arc::new(verifier), recorder.handle())
    }
}
