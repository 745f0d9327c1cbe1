pub mod analysis;
pub mod error;
pub mod feedback;
pub mod health;
pub mod metrics;
pub mod transcript;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Snapshots and audio chunks arrive base64-encoded in JSON bodies.
const BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;

/// The full HTTP API.
pub fn router(state: AppState, metrics_handle: Arc<PrometheusHandle>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/analyze", post(analysis::submit_analysis))
        .route("/api/analyze/{id}", get(analysis::get_analysis))
        .route("/api/analyze/snapshot", post(feedback::snapshot))
        .route("/api/analyze/audio_chunk", post(feedback::audio_chunk))
        .route("/api/analyze/transcript", post(feedback::transcript_snippet))
        .route("/api/transcript", post(transcript::fetch_transcript))
        .with_state(state)
        .route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(metrics_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}
