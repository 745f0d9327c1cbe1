//! Caption-based transcript sources.
//!
//! Each source is one step of the extraction fallback chain. They all end the same
//! way: pick a caption track, download it as WebVTT and flatten it to plain text.

mod innertube;
mod vtt;
mod watch_page;
mod ytdlp;

pub use innertube::InnertubeCaptions;
pub use vtt::flatten_vtt;
pub use watch_page::WatchPageCaptions;
pub use ytdlp::YtDlpSubtitles;

use async_trait::async_trait;
use serde::Deserialize;

use crate::services::media::MediaError;
use crate::services::video_ref::VideoRef;

/// Transcripts shorter than this are treated as missing.
pub const MIN_TRANSCRIPT_CHARS: usize = 50;

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Spoken text recovered for a video.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    /// Name of the step that produced it.
    pub source: &'static str,
    pub title: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Caption endpoint returned {status}")]
    Status { status: reqwest::StatusCode },

    #[error("No caption tracks available")]
    NoCaptions,

    #[error("Video unavailable: {0}")]
    Unavailable(String),

    #[error("Caption content was empty")]
    Empty,

    #[error("Failed to parse player response: {0}")]
    Parse(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One transcript-producing step of the extraction chain.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Stable name used in logs, metrics and the job's `extraction_method`.
    fn name(&self) -> &'static str;

    async fn fetch(&self, video: &VideoRef) -> Result<Transcript, ExtractError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    pub captions: Option<Captions>,
    #[serde(default)]
    pub video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayabilityStatus {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Captions {
    pub player_captions_tracklist_renderer: TrackList,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrackList {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CaptionTrack {
    pub base_url: String,
    #[serde(default)]
    pub language_code: String,
    /// `asr` for automatic speech recognition tracks.
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoDetails {
    #[serde(default)]
    pub title: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, lang: &str) -> bool {
        self.language_code == lang
            || self
                .language_code
                .strip_prefix(lang)
                .is_some_and(|rest| rest.starts_with('-'))
    }

    fn vtt_url(&self) -> String {
        let base = self.base_url.replace("&fmt=srv3", "");
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}fmt=vtt")
    }
}

impl PlayerResponse {
    pub fn title(&self) -> Option<String> {
        self.video_details.as_ref().and_then(|d| d.title.clone())
    }

    /// Caption tracks, or why there are none.
    pub fn into_tracks(self) -> Result<(Vec<CaptionTrack>, Option<String>), ExtractError> {
        let title = self.title();
        let tracks = self
            .captions
            .map(|c| c.player_captions_tracklist_renderer.caption_tracks)
            .unwrap_or_default();

        if !tracks.is_empty() {
            return Ok((tracks, title));
        }

        match self.playability_status {
            Some(status) if status.status != "OK" => Err(ExtractError::Unavailable(
                status.reason.unwrap_or(status.status),
            )),
            _ => Err(ExtractError::NoCaptions),
        }
    }
}

/// Prefer a manual track in a preferred language, then any track in a preferred
/// language, then whatever comes first.
pub(crate) fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Option<&'a CaptionTrack> {
    for lang in languages {
        if let Some(track) = tracks
            .iter()
            .find(|t| t.matches_language(lang) && !t.is_generated())
        {
            return Some(track);
        }
    }

    for lang in languages {
        if let Some(track) = tracks.iter().find(|t| t.matches_language(lang)) {
            return Some(track);
        }
    }

    tracks.first()
}

/// Download a caption track as WebVTT and flatten it.
pub(crate) async fn download_track(
    http: &reqwest::Client,
    track: &CaptionTrack,
) -> Result<String, ExtractError> {
    let response = http
        .get(track.vtt_url())
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ExtractError::Status {
            status: response.status(),
        });
    }

    let body = response.text().await?;
    non_empty_transcript(flatten_vtt(&body))
}

pub(crate) fn non_empty_transcript(text: String) -> Result<String, ExtractError> {
    if text.chars().count() < MIN_TRANSCRIPT_CHARS {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}
