use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::{
    gemini::GeminiClient,
    ingest::{self, Ingestor},
    media::YtDlp,
    metadata::MetadataClient,
    queue::{JobQueue, QueueError},
};

/// Shared application state passed to route handlers and the worker.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: Arc<JobQueue>,
    pub gemini: Arc<GeminiClient>,
    pub ingestor: Arc<Ingestor>,
    pub metadata: Arc<MetadataClient>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to initialize job queue: {0}")]
    Queue(#[from] QueueError),
}

impl AppState {
    pub fn new(
        db: PgPool,
        queue: JobQueue,
        gemini: GeminiClient,
        ingestor: Ingestor,
        metadata: MetadataClient,
    ) -> Self {
        Self {
            db,
            queue: Arc::new(queue),
            gemini: Arc::new(gemini),
            ingestor: Arc::new(ingestor),
            metadata: Arc::new(metadata),
        }
    }

    /// Wire every service from configuration. Nothing here opens a connection.
    pub fn from_config(db: PgPool, config: &AppConfig) -> Result<Self, StateError> {
        let http = ingest::http_client(config.http_timeout_secs)?;
        let gemini_http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gemini_timeout_secs))
            .build()?;

        let queue = JobQueue::new(&config.redis_url)?;
        let gemini = GeminiClient::new(
            gemini_http,
            &config.gemini_api_key,
            &config.gemini_model,
            &config.gemini_base_url,
        );
        let ingestor = Ingestor::from_config(config, http.clone());
        let metadata = MetadataClient::new(
            http,
            config.youtube_api_key.clone(),
            YtDlp::new(config.yt_dlp_bin.clone(), config.ytdlp_cookies_file.clone()),
        );

        Ok(Self::new(db, queue, gemini, ingestor, metadata))
    }
}
