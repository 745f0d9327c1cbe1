//! One job from queue payload to finished report.

use serde_json::Value;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::job::AnalysisStatus;
use crate::models::report::{self, VideoMetadata};
use crate::services::gemini::{CoachingBrief, GeminiClient, GeminiError};
use crate::services::ingest::{IngestError, IngestRequest, Ingested};
use crate::services::media::MediaError;
use crate::services::queue::QueuedJob;
use crate::services::video_ref::{SourceRef, VideoRefError};

/// Attempts a transient failure gets before the job is failed for good.
pub const MAX_RETRIES: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid video reference: {0}")]
    Source(#[from] VideoRefError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Could not read extracted media: {0}")]
    Media(#[from] MediaError),

    #[error("AI analysis failed: {0}")]
    Gemini(#[from] GeminiError),
}

impl PipelineError {
    /// Whether re-running the whole job could succeed. The extraction chain has
    /// already tried every fallback, so only infrastructure and model-side
    /// hiccups count.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Database(_) => true,
            PipelineError::Gemini(e) => e.is_retryable(),
            PipelineError::Source(_) | PipelineError::Ingest(_) | PipelineError::Media(_) => false,
        }
    }
}

/// What the worker does with a job whose run just failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureAction {
    /// Back to `pending` and onto the queue.
    Requeue,
    /// Mark failed with this message.
    Fail(String),
}

/// Decide a failed job's fate. `retry_count` already includes the attempt that
/// just failed.
pub fn next_action(error: &PipelineError, retry_count: i32) -> FailureAction {
    if !error.is_retryable() {
        return FailureAction::Fail(error.to_string());
    }
    if retry_count < MAX_RETRIES {
        return FailureAction::Requeue;
    }
    FailureAction::Fail(format!(
        "Processing failed after {retry_count} attempts: {error}"
    ))
}

/// Run extraction and analysis for a queued job, moving the record through
/// `downloading` and `analyzing`. The caller stores the returned report.
pub async fn process_job(state: &AppState, job: &QueuedJob) -> Result<Value, PipelineError> {
    let source = SourceRef::parse(&job.youtube_url)?;
    if let SourceRef::Demo = source {
        return Ok(report::demo_report());
    }

    set_status(state, job.job_id, AnalysisStatus::Downloading).await?;

    let mut metadata = match source.video() {
        Some(video) => state.metadata.lookup(video).await,
        None => None,
    };

    let request = IngestRequest {
        video: source.video().cloned(),
        transcript: job.transcript_text.clone(),
    };
    let ingested = state.ingestor.ingest(&request).await?;
    let method = ingested.method();

    tracing::info!(job_id = %job.job_id, method, "Content extracted");
    queries::set_extraction_method(&state.db, job.job_id, method).await?;

    if metadata.is_none() {
        if let Ingested::Transcript(transcript) = &ingested {
            metadata = transcript.title.clone().map(|title| VideoMetadata {
                title: Some(title),
                ..Default::default()
            });
        }
    }

    set_status(state, job.job_id, AnalysisStatus::Analyzing).await?;

    let brief = CoachingBrief {
        context: job.context.clone(),
        metadata: metadata.clone(),
    };

    let start = std::time::Instant::now();
    let mut report = analyze(&state.gemini, ingested, &brief).await?;
    tracing::info!(
        job_id = %job.job_id,
        model = state.gemini.model(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Model analysis complete"
    );

    report::inject_metadata(&mut report, &metadata.unwrap_or_default(), method);
    Ok(report)
}

async fn set_status(state: &AppState, job_id: Uuid, status: AnalysisStatus) -> Result<(), sqlx::Error> {
    queries::update_job_status(&state.db, job_id, status).await?;
    tracing::debug!(job_id = %job_id, status = %status, "Job status updated");
    Ok(())
}

/// Hand extracted content to the matching model call.
async fn analyze(
    gemini: &GeminiClient,
    ingested: Ingested,
    brief: &CoachingBrief,
) -> Result<Value, PipelineError> {
    let report = match ingested {
        Ingested::Transcript(transcript) => {
            gemini.analyze_transcript(&transcript.text, brief).await?
        }
        Ingested::Audio { asset, .. } => {
            let bytes = asset.read().await?;
            gemini.analyze_audio(&bytes, asset.mime_type(), brief).await?
        }
        Ingested::RemoteVideo { uri } => gemini.analyze_video_uri(&uri, brief).await?,
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ingest::Attempt;

    #[test]
    fn test_model_throttling_is_retryable() {
        let err = PipelineError::Gemini(GeminiError::Api {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "quota".to_string(),
        });
        assert!(err.is_retryable());

        let err = PipelineError::Gemini(GeminiError::Api {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn test_bad_input_is_final() {
        let err = PipelineError::Gemini(GeminiError::Api {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "invalid argument".to_string(),
        });
        assert!(!err.is_retryable());

        assert!(!PipelineError::Gemini(GeminiError::Parse("eof".to_string())).is_retryable());
        assert!(!PipelineError::Source(VideoRefError::MissingId("x".to_string())).is_retryable());
        assert!(!PipelineError::Ingest(IngestError::NoSource).is_retryable());
    }

    #[test]
    fn test_exhausted_chain_is_final() {
        let err = PipelineError::Ingest(IngestError::Exhausted(vec![Attempt {
            strategy: "watch_page_captions",
            error: "No caption tracks available".to_string(),
        }]));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("watch_page_captions"));
    }

    fn throttled() -> PipelineError {
        PipelineError::Gemini(GeminiError::Api {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "quota".to_string(),
        })
    }

    #[test]
    fn test_transient_failure_requeued_below_limit() {
        assert_eq!(next_action(&throttled(), 1), FailureAction::Requeue);
        assert_eq!(next_action(&throttled(), 2), FailureAction::Requeue);
    }

    #[test]
    fn test_transient_failure_fails_at_limit() {
        match next_action(&throttled(), 3) {
            FailureAction::Fail(message) => {
                assert!(message.starts_with("Processing failed after 3 attempts: "));
                assert!(message.contains("429"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_final_failure_not_retried() {
        let err = PipelineError::Ingest(IngestError::NoSource);
        assert_eq!(next_action(&err, 1), FailureAction::Fail(err.to_string()));
    }

    #[test]
    fn test_database_errors_are_retryable() {
        assert!(PipelineError::Database(sqlx::Error::PoolTimedOut).is_retryable());
    }
}
