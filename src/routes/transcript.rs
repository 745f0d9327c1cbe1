use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::models::analysis::{TranscriptRequest, TranscriptResponse};
use crate::routes::error::ApiError;
use crate::services::ingest::IngestError;
use crate::services::video_ref::VideoRef;

/// POST /api/transcript: Captions for a video, without running an analysis.
pub async fn fetch_transcript(
    State(state): State<AppState>,
    request: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let Json(request) = request?;
    request.validate()?;

    let video = VideoRef::parse(&request.url).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let transcript = match state.ingestor.fetch_transcript(&video).await {
        Ok(t) => t,
        Err(IngestError::Exhausted(attempts)) => {
            tracing::info!(video_id = %video, attempts = attempts.len(), "No transcript found");
            return Err(ApiError::NotFound(
                "No captions available for this video".to_string(),
            ));
        }
        Err(e) => return Err(ApiError::BadRequest(e.to_string())),
    };

    Ok(Json(TranscriptResponse {
        character_count: transcript.text.chars().count(),
        video_id: video.id().to_string(),
        video_title: transcript.title.unwrap_or_else(|| "YouTube Video".to_string()),
        source: transcript.source.to_string(),
        transcript: transcript.text,
    }))
}
