use chrono::Utc;
use comms_coach::{
    app_state::AppState,
    config::AppConfig,
    db::{self, queries},
    models::job::AnalysisStatus,
    routes::metrics::install_listener,
    services::{
        pipeline::{self, FailureAction, PipelineError},
        queue::QueuedJob,
    },
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 1000; // 1 second
const STALE_AFTER_MINUTES: i64 = 15;
const STALE_BATCH: i64 = 100;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting analysis worker");

    let config = AppConfig::from_env().expect("Failed to load configuration");

    match config.worker_metrics_addr.parse::<SocketAddr>() {
        Ok(addr) => {
            if let Err(e) = install_listener(addr) {
                tracing::warn!(error = %e, "Metrics listener disabled");
            }
        }
        Err(e) => tracing::warn!(
            addr = %config.worker_metrics_addr,
            error = %e,
            "Invalid metrics address, metrics listener disabled"
        ),
    }

    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let state = AppState::from_config(db_pool, &config).expect("Failed to initialize services");

    if let Err(e) = tokio::fs::create_dir_all(&config.work_dir).await {
        tracing::warn!(work_dir = %config.work_dir.display(), error = %e, "Could not create work dir");
    }

    match recover_stale_jobs(&state).await {
        Ok(0) => {}
        Ok(n) => tracing::info!(count = n, "Re-queued stale jobs"),
        Err(e) => tracing::error!(error = %e, "Stale job recovery failed"),
    }

    tracing::info!("Worker ready, starting job processing loop");

    loop {
        match process_next_job(&state).await {
            Ok(true) => {
                tracing::debug!("Job processed, checking for next job");
            }
            Ok(false) => {
                tracing::trace!("No jobs available, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error processing job, will retry");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Put jobs left mid-flight by a crashed worker back on the queue.
async fn recover_stale_jobs(state: &AppState) -> Result<usize, BoxError> {
    let cutoff = Utc::now() - chrono::Duration::minutes(STALE_AFTER_MINUTES);
    let stale = queries::get_stale_jobs(&state.db, cutoff, STALE_BATCH).await?;

    let ids: Vec<_> = stale.iter().map(|job| job.id).collect();
    let released = state.queue.release_in_flight(&ids).await?;
    if released > 0 {
        tracing::info!(count = released, "Cleared abandoned in-flight entries");
    }

    for job in &stale {
        tracing::info!(
            job_id = %job.id,
            status = %job.status,
            updated_at = %job.updated_at,
            "Re-queueing stale job"
        );
        queries::update_job_status(&state.db, job.id, AnalysisStatus::Pending).await?;
        state.queue.enqueue(&QueuedJob::from_record(job)).await?;
    }

    Ok(stale.len())
}

/// Process the next job from the queue.
/// Returns Ok(true) if a job was handled, Ok(false) if the queue was empty.
async fn process_next_job(state: &AppState) -> Result<bool, BoxError> {
    let job = match state.queue.dequeue().await? {
        Some(j) => j,
        None => {
            let depth = state.queue.queue_depth().await?;
            metrics::gauge!("analysis_queue_depth").set(depth as f64);
            return Ok(false);
        }
    };

    // Stale recovery can queue a job twice.
    match queries::get_job(&state.db, job.job_id).await? {
        Some(record) if record.status.is_terminal() => {
            tracing::info!(job_id = %job.job_id, status = %record.status, "Skipping finished job");
            state.queue.complete(&job).await?;
            return Ok(true);
        }
        Some(_) => {}
        None => {
            tracing::warn!(job_id = %job.job_id, "Queued job has no record, dropping");
            state.queue.complete(&job).await?;
            return Ok(true);
        }
    }

    tracing::info!(
        job_id = %job.job_id,
        source = %job.youtube_url,
        "Processing analysis job"
    );

    let start = Instant::now();
    match pipeline::process_job(state, &job).await {
        Ok(report) => {
            queries::complete_job(&state.db, job.job_id, report).await?;
            state.queue.complete(&job).await?;

            let elapsed = start.elapsed();
            metrics::counter!("analysis_jobs_completed").increment(1);
            metrics::histogram!("analysis_processing_seconds").record(elapsed.as_secs_f64());

            tracing::info!(
                job_id = %job.job_id,
                duration_ms = elapsed.as_millis() as u64,
                "Job completed successfully"
            );
        }
        Err(e) => handle_failure(state, &job, e).await?,
    }

    Ok(true)
}

async fn handle_failure(state: &AppState, job: &QueuedJob, error: PipelineError) -> Result<(), BoxError> {
    let retry_count = queries::increment_retry_count(&state.db, job.job_id).await?;

    let message = match pipeline::next_action(&error, retry_count) {
        FailureAction::Requeue => {
            tracing::warn!(
                job_id = %job.job_id,
                retry_count,
                error = %error,
                "Job failed with a transient error, re-queueing"
            );
            queries::update_job_status(&state.db, job.job_id, AnalysisStatus::Pending).await?;
            state.queue.enqueue(job).await?;
            state.queue.complete(job).await?;
            return Ok(());
        }
        FailureAction::Fail(message) => message,
    };

    queries::fail_job(&state.db, job.job_id, &message).await?;
    state.queue.complete(job).await?;
    metrics::counter!("analysis_jobs_failed").increment(1);

    tracing::error!(
        job_id = %job.job_id,
        retry_count,
        error = %error,
        "Job failed"
    );

    Ok(())
}
