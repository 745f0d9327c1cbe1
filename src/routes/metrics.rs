use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;

fn describe_metrics() {
    metrics::describe_counter!("analysis_jobs_total", "Analysis jobs submitted");
    metrics::describe_counter!("analysis_jobs_completed", "Analysis jobs completed");
    metrics::describe_counter!("analysis_jobs_failed", "Analysis jobs that failed permanently");
    metrics::describe_counter!(
        "extraction_attempts_total",
        "Extraction fallback steps attempted, by strategy and outcome"
    );
    metrics::describe_histogram!(
        "analysis_processing_seconds",
        "Time to process one analysis job"
    );
    metrics::describe_histogram!("gemini_request_seconds", "Latency of Gemini API calls");
    metrics::describe_gauge!("analysis_queue_depth", "Jobs waiting in the queue");
}

/// Install the global recorder for the API server, scraped through `/metrics`.
pub fn install_recorder() -> Result<Arc<PrometheusHandle>, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(Arc::new(handle))
}

/// Install the global recorder for a worker, served on its own listener.
pub fn install_listener(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    Ok(())
}

/// GET /metrics: Prometheus text exposition.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
