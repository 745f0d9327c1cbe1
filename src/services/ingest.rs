//! The extraction fallback chain.
//!
//! Steps run in a fixed order and the first success wins:
//!
//! 1. a transcript supplied by the caller,
//! 2. each caption source ([`TranscriptSource`]) in configured order,
//! 3. audio download and re-encode ([`MediaSource`]),
//! 4. handing the public video URL to the multimodal model.
//!
//! Every failed step is logged and counted before the next one runs.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::captions::{
    InnertubeCaptions, Transcript, TranscriptSource, WatchPageCaptions, YtDlpSubtitles,
};
use crate::services::media::{AudioDownloader, Ffmpeg, MediaAsset, MediaSource, YtDlp};
use crate::services::video_ref::VideoRef;

pub const PROVIDED_METHOD: &str = "provided";
pub const REMOTE_VIDEO_METHOD: &str = "remote_video";

/// Speech content obtained for a job, ready for the model.
#[derive(Debug)]
pub enum Ingested {
    Transcript(Transcript),
    Audio {
        asset: MediaAsset,
        method: &'static str,
    },
    RemoteVideo {
        uri: String,
    },
}

impl Ingested {
    /// Name of the step that produced this content.
    pub fn method(&self) -> &'static str {
        match self {
            Ingested::Transcript(t) => t.source,
            Ingested::Audio { method, .. } => method,
            Ingested::RemoteVideo { .. } => REMOTE_VIDEO_METHOD,
        }
    }
}

/// What the chain has to work with.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub video: Option<VideoRef>,
    pub transcript: Option<String>,
}

/// One failed step.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub strategy: &'static str,
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("No transcript provided and no video to extract from")]
    NoSource,

    #[error("All extraction methods failed: {}", AttemptList(.0))]
    Exhausted(Vec<Attempt>),
}

struct AttemptList<'a>(&'a [Attempt]);

impl fmt::Display for AttemptList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", attempt.strategy, attempt.error)?;
        }
        Ok(())
    }
}

fn record_attempt(strategy: &'static str, outcome: &'static str) {
    metrics::counter!(
        "extraction_attempts_total",
        "strategy" => strategy,
        "outcome" => outcome
    )
    .increment(1);
}

/// Runs the extraction fallback chain.
pub struct Ingestor {
    transcript_sources: Vec<Box<dyn TranscriptSource>>,
    media_source: Option<Box<dyn MediaSource>>,
    remote_video_fallback: bool,
}

impl Ingestor {
    pub fn new(
        transcript_sources: Vec<Box<dyn TranscriptSource>>,
        media_source: Option<Box<dyn MediaSource>>,
        remote_video_fallback: bool,
    ) -> Self {
        Self {
            transcript_sources,
            media_source,
            remote_video_fallback,
        }
    }

    /// The production chain: watch page, player API, yt-dlp subtitles, audio
    /// download, then the model watching the video itself.
    pub fn from_config(config: &AppConfig, http: reqwest::Client) -> Self {
        let languages = config.caption_languages();
        let ytdlp = YtDlp::new(config.yt_dlp_bin.clone(), config.ytdlp_cookies_file.clone());
        let work_dir: PathBuf = config.work_dir.clone();

        let transcript_sources: Vec<Box<dyn TranscriptSource>> = vec![
            Box::new(WatchPageCaptions::new(http.clone(), languages.clone())),
            Box::new(InnertubeCaptions::new(http, languages.clone())),
            Box::new(YtDlpSubtitles::new(ytdlp.clone(), work_dir.clone(), languages)),
        ];

        let media = AudioDownloader::new(ytdlp, Ffmpeg::new(config.ffmpeg_bin.clone()), work_dir);

        Self::new(transcript_sources, Some(Box::new(media)), true)
    }

    /// Caption sources only, in order. Used where a transcript is all that helps.
    pub async fn fetch_transcript(&self, video: &VideoRef) -> Result<Transcript, IngestError> {
        let mut attempts = Vec::new();
        match self.try_transcript_sources(video, &mut attempts).await {
            Some(transcript) => Ok(transcript),
            None => Err(IngestError::Exhausted(attempts)),
        }
    }

    pub async fn ingest(&self, request: &IngestRequest) -> Result<Ingested, IngestError> {
        if let Some(text) = request
            .transcript
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            record_attempt(PROVIDED_METHOD, "success");
            return Ok(Ingested::Transcript(Transcript {
                text: text.to_string(),
                source: PROVIDED_METHOD,
                title: None,
                language: None,
            }));
        }

        let video = request.video.as_ref().ok_or(IngestError::NoSource)?;
        let mut attempts = Vec::new();

        if let Some(transcript) = self.try_transcript_sources(video, &mut attempts).await {
            return Ok(Ingested::Transcript(transcript));
        }

        if let Some(media) = &self.media_source {
            let strategy = media.name();
            match media.fetch(video).await {
                Ok(asset) => {
                    record_attempt(strategy, "success");
                    tracing::info!(video_id = %video, strategy, path = %asset.path().display(), "Media extracted");
                    return Ok(Ingested::Audio {
                        asset,
                        method: strategy,
                    });
                }
                Err(e) => {
                    record_attempt(strategy, "failure");
                    tracing::warn!(video_id = %video, strategy, error = %e, "Extraction step failed");
                    attempts.push(Attempt {
                        strategy,
                        error: e.to_string(),
                    });
                }
            }
        }

        if self.remote_video_fallback {
            record_attempt(REMOTE_VIDEO_METHOD, "success");
            tracing::info!(video_id = %video, "Falling back to multimodal analysis of the video URL");
            return Ok(Ingested::RemoteVideo {
                uri: video.watch_url(),
            });
        }

        Err(IngestError::Exhausted(attempts))
    }

    async fn try_transcript_sources(
        &self,
        video: &VideoRef,
        attempts: &mut Vec<Attempt>,
    ) -> Option<Transcript> {
        for source in &self.transcript_sources {
            let strategy = source.name();
            tracing::debug!(video_id = %video, strategy, "Trying extraction step");

            match source.fetch(video).await {
                Ok(transcript) => {
                    record_attempt(strategy, "success");
                    tracing::info!(
                        video_id = %video,
                        strategy,
                        chars = transcript.text.len(),
                        "Transcript extracted"
                    );
                    return Some(transcript);
                }
                Err(e) => {
                    record_attempt(strategy, "failure");
                    tracing::warn!(video_id = %video, strategy, error = %e, "Extraction step failed");
                    attempts.push(Attempt {
                        strategy,
                        error: e.to_string(),
                    });
                }
            }
        }

        None
    }
}

/// Timeout-bound HTTP client shared by the caption and metadata lookups.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
}
