//! Short synchronous feedback for live coaching while a video plays.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use base64::Engine;
use garde::Validate;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::models::analysis::{AudioChunkRequest, SnapshotRequest, SnippetRequest};
use crate::routes::error::ApiError;

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// Decoded bytes of a base64 string or `data:<mime>;base64,<payload>` URL,
/// plus the declared MIME type when there was one.
pub(crate) fn decode_payload(data: &str) -> Result<(Vec<u8>, Option<String>), ApiError> {
    let data = data.trim();

    let (mime, payload) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| ApiError::BadRequest("Malformed data URL".to_string()))?;
            let mime = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            (mime, payload)
        }
        None => (None, data),
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 payload: {e}")))?;

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Empty payload".to_string()));
    }

    Ok((bytes, mime))
}

fn with_timestamp(mut feedback: Value, timestamp: f64) -> Value {
    if let Some(obj) = feedback.as_object_mut() {
        obj.insert("timestamp".into(), json!(timestamp));
    }
    feedback
}

/// POST /api/analyze/snapshot: Visual presence feedback on one frame.
pub async fn snapshot(
    State(state): State<AppState>,
    request: Result<Json<SnapshotRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = request?;
    request.validate()?;

    let (bytes, _) = decode_payload(&request.image_data)?;
    let format = image::guess_format(&bytes)
        .map_err(|_| ApiError::UnsupportedMedia("Unrecognized image format".to_string()))?;

    tracing::debug!(
        video_url = %request.video_url,
        timestamp = request.timestamp,
        format = ?format,
        "Snapshot feedback requested"
    );

    let feedback = state
        .gemini
        .analyze_snapshot(&bytes, format.to_mime_type())
        .await?;

    Ok(Json(with_timestamp(feedback, request.timestamp)))
}

/// POST /api/analyze/audio_chunk: Vocal delivery feedback on a few seconds of audio.
pub async fn audio_chunk(
    State(state): State<AppState>,
    request: Result<Json<AudioChunkRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = request?;
    request.validate()?;

    let (bytes, mime) = decode_payload(&request.audio_data)?;
    let mime = mime.unwrap_or_else(|| DEFAULT_AUDIO_MIME.to_string());
    if !mime.starts_with("audio/") && !mime.starts_with("video/") {
        return Err(ApiError::UnsupportedMedia(format!(
            "Expected audio data, got {mime}"
        )));
    }

    let feedback = state.gemini.analyze_audio_chunk(&bytes, &mime).await?;
    Ok(Json(with_timestamp(feedback, request.timestamp)))
}

/// POST /api/analyze/transcript: Feedback on a passage of text. Model failures
/// come back as a zero score so live clients keep running.
pub async fn transcript_snippet(
    State(state): State<AppState>,
    request: Result<Json<SnippetRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = request?;
    request.validate()?;

    match state.gemini.analyze_snippet(&request.text).await {
        Ok(feedback) => Ok(Json(feedback)),
        Err(e) => {
            tracing::warn!(error = %e, "Snippet feedback failed");
            Ok(Json(json!({
                "error": e.to_string(),
                "score": 0,
                "feedback": "Feedback is unavailable right now."
            })))
        }
    }
}
