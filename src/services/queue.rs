use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{AnalysisContext, AnalysisJob};

const QUEUE_KEY: &str = "comms_coach:jobs";
const PROCESSING_KEY: &str = "comms_coach:processing";

/// Job payload serialized into Redis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedJob {
    pub job_id: Uuid,
    pub youtube_url: String,
    #[serde(default)]
    pub transcript_text: Option<String>,
    #[serde(default)]
    pub context: AnalysisContext,
}

impl QueuedJob {
    /// Rebuild a payload from a stored record. Caller-supplied transcripts are not
    /// persisted, so a recovered manual-input job carries none.
    pub fn from_record(job: &AnalysisJob) -> Self {
        Self {
            job_id: job.id,
            youtube_url: job.youtube_url.clone(),
            transcript_text: None,
            context: job.context(),
        }
    }
}

/// Redis-backed job queue with an in-flight list.
#[derive(Clone)]
pub struct JobQueue {
    client: redis::Client,
}

impl JobQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, QueueError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    pub async fn enqueue(&self, job: &QueuedJob) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(job)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, &payload).await?;
        Ok(())
    }

    /// Pop the oldest job, moving it onto the in-flight list.
    pub async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError> {
        let mut conn = self.connection().await?;
        let result: Option<String> = conn.rpoplpush(QUEUE_KEY, PROCESSING_KEY).await?;

        match result {
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(job) => Ok(Some(job)),
                Err(e) => {
                    // Unreadable payloads would otherwise sit in the in-flight list forever.
                    conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, &payload).await?;
                    Err(QueueError::Serialize(e))
                }
            },
            None => Ok(None),
        }
    }

    /// Drop a job from the in-flight list.
    pub async fn complete(&self, job: &QueuedJob) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(job)?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, &payload).await?;
        Ok(())
    }

    /// Drop in-flight entries for the given jobs, plus any that no longer parse.
    /// Returns how many entries were removed.
    pub async fn release_in_flight(&self, job_ids: &[Uuid]) -> Result<usize, QueueError> {
        let mut conn = self.connection().await?;
        let entries: Vec<String> = conn.lrange(PROCESSING_KEY, 0, -1).await?;

        let mut removed = 0;
        for payload in entries.iter().filter(|p| is_released(p, job_ids)) {
            let n: usize = conn.lrem(PROCESSING_KEY, 1, payload).await?;
            removed += n;
        }
        Ok(removed)
    }

    /// Pending jobs not yet picked up by a worker.
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self.connection().await?;
        let depth: u64 = conn.llen(QUEUE_KEY).await?;
        Ok(depth)
    }

    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

fn is_released(payload: &str, job_ids: &[Uuid]) -> bool {
    match serde_json::from_str::<QueuedJob>(payload) {
        Ok(job) => job_ids.contains(&job.job_id),
        Err(_) => true,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::AnalysisStatus;
    use chrono::Utc;

    #[test]
    fn test_payload_shape() {
        let job = QueuedJob {
            job_id: Uuid::nil(),
            youtube_url: "https://youtu.be/E7wUGafs0LY".to_string(),
            transcript_text: None,
            context: AnalysisContext {
                company: Some("Acme".to_string()),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["youtube_url"], "https://youtu.be/E7wUGafs0LY");
        assert_eq!(value["context"]["company"], "Acme");
        assert!(value["transcript_text"].is_null());
    }

    #[test]
    fn test_payload_without_optional_fields() {
        let job: QueuedJob = serde_json::from_str(
            r#"{"job_id":"00000000-0000-0000-0000-000000000000","youtube_url":"MANUAL_INPUT"}"#,
        )
        .unwrap();
        assert_eq!(job.context, AnalysisContext::default());
        assert!(job.transcript_text.is_none());
    }

    #[test]
    fn test_from_record_copies_context() {
        let now = Utc::now();
        let record = AnalysisJob {
            id: Uuid::new_v4(),
            user_id: None,
            youtube_url: "https://youtu.be/E7wUGafs0LY".to_string(),
            video_title: Some("Keynote".to_string()),
            company: None,
            role: Some("CEO".to_string()),
            target_person: None,
            status: AnalysisStatus::Downloading,
            analysis_results: None,
            error_message: None,
            extraction_method: None,
            retry_count: 1,
            created_at: now,
            updated_at: now,
        };

        let job = QueuedJob::from_record(&record);
        assert_eq!(job.job_id, record.id);
        assert_eq!(job.context.video_title.as_deref(), Some("Keynote"));
        assert_eq!(job.context.role.as_deref(), Some("CEO"));
    }

    #[test]
    fn test_release_matches_listed_jobs_and_garbage() {
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();
        let payload = |id| {
            serde_json::to_string(&QueuedJob {
                job_id: id,
                youtube_url: "https://youtu.be/E7wUGafs0LY".to_string(),
                transcript_text: None,
                context: AnalysisContext::default(),
            })
            .unwrap()
        };

        assert!(is_released(&payload(stale), &[stale]));
        assert!(!is_released(&payload(live), &[stale]));
        assert!(is_released("{truncated", &[stale]));
    }

    #[test]
    fn test_invalid_redis_url() {
        assert!(JobQueue::new("not a url").is_err());
    }
}
