use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::analysis::{AnalyzeRequest, AnalyzeResponse};
use crate::models::job::{AnalysisContext, AnalysisJob, NewAnalysis};
use crate::models::report::{demo_report, DEMO_VIDEO_URL};
use crate::routes::error::ApiError;
use crate::services::queue::QueuedJob;
use crate::services::video_ref::SourceRef;

/// POST /api/analyze: Create a job record and queue it for the worker.
pub async fn submit_analysis(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = request?;
    request.validate()?;

    let source = SourceRef::parse(&request.youtube_url)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if let SourceRef::Demo = source {
        return submit_demo(&state, &request).await;
    }

    if matches!(source, SourceRef::Manual) && request.transcript().is_none() {
        return Err(ApiError::BadRequest(
            "transcript_text is required for manual input".to_string(),
        ));
    }

    let new = NewAnalysis {
        user_id: request.user_id.clone(),
        youtube_url: request.youtube_url.trim().to_string(),
        context: request.context(),
    };
    let job = queries::create_job(&state.db, &new).await?;

    let queued = QueuedJob {
        job_id: job.id,
        youtube_url: job.youtube_url.clone(),
        transcript_text: request.transcript().map(str::to_string),
        context: new.context,
    };

    if let Err(e) = state.queue.enqueue(&queued).await {
        // The record would otherwise sit in `pending` with nothing to pick it up.
        queries::fail_job(&state.db, job.id, "Could not queue analysis").await?;
        return Err(e.into());
    }

    metrics::counter!("analysis_jobs_total").increment(1);
    tracing::info!(job_id = %job.id, source = %queued.youtube_url, "Analysis queued");

    Ok(Json(AnalyzeResponse {
        status: "queued".to_string(),
        analysis_id: job.id,
    }))
}

async fn submit_demo(
    state: &AppState,
    request: &AnalyzeRequest,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let context = request.context();
    let new = NewAnalysis {
        user_id: request.user_id.clone(),
        youtube_url: DEMO_VIDEO_URL.to_string(),
        context: AnalysisContext {
            video_title: context
                .video_title
                .or_else(|| Some("Jon Lin on CNBC".to_string())),
            ..context
        },
    };

    let job = queries::insert_completed_job(&state.db, &new, demo_report()).await?;
    tracing::info!(job_id = %job.id, "Demo analysis stored");

    Ok(Json(AnalyzeResponse {
        status: "completed".to_string(),
        analysis_id: job.id,
    }))
}

/// GET /api/analyze/{id}: Current state of a job.
pub async fn get_analysis(
    State(state): State<AppState>,
    job_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AnalysisJob>, ApiError> {
    let Path(job_id) = job_id?;
    let job = queries::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Analysis not found".to_string()))?;

    Ok(Json(job))
}
