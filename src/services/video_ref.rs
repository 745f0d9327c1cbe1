//! Parsing of submitted video references.

use reqwest::Url;
use std::fmt;

/// Marker submitted instead of a URL to get a canned demo report.
pub const DEMO_MODE: &str = "DEMO_MODE";

/// Marker submitted when the caller pasted a transcript and has no video.
pub const MANUAL_INPUT: &str = "MANUAL_INPUT";

const VIDEO_ID_LEN: usize = 11;

/// A hosted video, identified by its 11-character YouTube id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    id: String,
}

/// What a submission points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Demo,
    Manual,
    Video(VideoRef),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VideoRefError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported video host: {0}")]
    UnsupportedHost(String),

    #[error("No video id found in URL: {0}")]
    MissingId(String),
}

impl VideoRef {
    pub fn parse(input: &str) -> Result<Self, VideoRefError> {
        let trimmed = input.trim();
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&with_scheme)
            .map_err(|_| VideoRefError::InvalidUrl(trimmed.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| VideoRefError::InvalidUrl(trimmed.to_string()))?
            .trim_start_matches("www.")
            .trim_start_matches("m.")
            .trim_start_matches("music.");

        let candidate = match host {
            "youtu.be" => url
                .path_segments()
                .and_then(|mut segments| segments.next())
                .map(str::to_string),
            "youtube.com" | "youtube-nocookie.com" => {
                let mut segments = url.path_segments().map(|s| s.collect::<Vec<_>>()).unwrap_or_default();
                segments.retain(|s| !s.is_empty());
                match segments.as_slice() {
                    ["watch"] => url
                        .query_pairs()
                        .find(|(k, _)| k == "v")
                        .map(|(_, v)| v.into_owned()),
                    ["embed" | "shorts" | "live" | "v", id, ..] => Some(id.to_string()),
                    _ => None,
                }
            }
            other => return Err(VideoRefError::UnsupportedHost(other.to_string())),
        };

        match candidate {
            Some(id) if is_valid_id(&id) => Ok(Self { id }),
            _ => Err(VideoRefError::MissingId(trimmed.to_string())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl SourceRef {
    pub fn parse(input: &str) -> Result<Self, VideoRefError> {
        match input.trim() {
            DEMO_MODE => Ok(SourceRef::Demo),
            MANUAL_INPUT => Ok(SourceRef::Manual),
            other => VideoRef::parse(other).map(SourceRef::Video),
        }
    }

    pub fn video(&self) -> Option<&VideoRef> {
        match self {
            SourceRef::Video(video) => Some(video),
            _ => None,
        }
    }
}

fn is_valid_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
