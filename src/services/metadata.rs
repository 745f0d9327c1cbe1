//! Best-effort video metadata lookup.

use serde::Deserialize;

use crate::models::report::VideoMetadata;
use crate::services::media::{MediaError, YtDlp};
use crate::services::video_ref::VideoRef;

const DATA_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Media(#[from] MediaError),
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Snippet,
    content_details: Option<ContentDetails>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    channel_title: Option<String>,
    channel_id: Option<String>,
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

/// Looks up title, channel, publish date and duration for a video.
pub struct MetadataClient {
    http: reqwest::Client,
    api_key: Option<String>,
    ytdlp: YtDlp,
}

impl MetadataClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, ytdlp: YtDlp) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            ytdlp,
        }
    }

    /// Metadata for `video`, or `None` when every lookup failed.
    pub async fn lookup(&self, video: &VideoRef) -> Option<VideoMetadata> {
        if let Some(key) = &self.api_key {
            match self.from_data_api(video, key).await {
                Ok(metadata) => return Some(metadata),
                Err(e) => {
                    tracing::warn!(video_id = %video, error = %e, "Data API metadata lookup failed")
                }
            }
        }

        match self.from_ytdlp(video).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!(video_id = %video, error = %e, "yt-dlp metadata lookup failed");
                None
            }
        }
    }

    async fn from_data_api(&self, video: &VideoRef, key: &str) -> Result<VideoMetadata, MetadataError> {
        let response: VideoListResponse = self
            .http
            .get(DATA_API_URL)
            .query(&[
                ("id", video.id()),
                ("part", "snippet,contentDetails"),
                ("key", key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| MetadataError::NotFound(video.id().to_string()))?;

        Ok(VideoMetadata {
            title: item.snippet.title,
            author: item.snippet.channel_title,
            publish_date: item.snippet.published_at,
            duration_seconds: item
                .content_details
                .and_then(|d| d.duration)
                .and_then(|d| parse_iso8601_duration(&d)),
            channel_url: item
                .snippet
                .channel_id
                .map(|id| format!("https://www.youtube.com/channel/{id}")),
        })
    }

    async fn from_ytdlp(&self, video: &VideoRef) -> Result<VideoMetadata, MetadataError> {
        let info = self.ytdlp.dump_json(video).await?;
        Ok(metadata_from_ytdlp_info(&info))
    }
}

pub(crate) fn metadata_from_ytdlp_info(info: &serde_json::Value) -> VideoMetadata {
    let text = |key: &str| info.get(key).and_then(|v| v.as_str()).map(str::to_string);

    VideoMetadata {
        title: text("title"),
        author: text("uploader").or_else(|| text("channel")),
        publish_date: text("upload_date"),
        duration_seconds: info
            .get("duration")
            .and_then(|d| d.as_f64())
            .filter(|d| *d >= 0.0)
            .map(|d| d.round() as u64),
        channel_url: text("channel_url"),
    }
}

/// Parse the `PT#H#M#S` durations returned by the Data API into seconds.
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let rest = value.strip_prefix('P')?;
    let (days, time) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut total = 0u64;

    if !days.is_empty() {
        let n = days.strip_suffix('D')?;
        total += n.parse::<u64>().ok()? * 86_400;
    }

    let mut number = String::new();
    for c in time.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let n: u64 = number.parse().ok()?;
        number.clear();
        total += match c {
            'H' => n * 3600,
            'M' => n * 60,
            'S' => n,
            _ => return None,
        };
    }

    if !number.is_empty() {
        return None;
    }

    Some(total)
}
