use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::job::AnalysisContext;

/// Request to analyze a video (or a pasted transcript).
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    /// Video URL, or one of the `DEMO_MODE` / `MANUAL_INPUT` markers.
    #[garde(length(min = 1, max = 2048))]
    pub youtube_url: String,

    #[serde(default)]
    #[garde(length(max = 200))]
    pub user_id: Option<String>,

    #[serde(default)]
    #[garde(length(max = 200))]
    pub video_title: Option<String>,

    #[serde(default)]
    #[garde(length(max = 200))]
    pub company: Option<String>,

    #[serde(default)]
    #[garde(length(max = 200))]
    pub role: Option<String>,

    #[serde(default)]
    #[garde(length(max = 200))]
    pub target_person: Option<String>,

    /// Transcript already obtained by the caller; skips caption extraction.
    #[serde(default)]
    #[garde(skip)]
    pub transcript_text: Option<String>,
}

impl AnalyzeRequest {
    pub fn context(&self) -> AnalysisContext {
        AnalysisContext {
            video_title: non_blank(&self.video_title),
            company: non_blank(&self.company),
            role: non_blank(&self.role),
            target_person: non_blank(&self.target_person),
        }
    }

    /// Caller transcript, if it has any content.
    pub fn transcript(&self) -> Option<&str> {
        self.transcript_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Response after submitting an analysis.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub analysis_id: uuid::Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TranscriptRequest {
    #[garde(length(min = 1, max = 2048))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub transcript: String,
    pub video_id: String,
    pub video_title: String,
    pub character_count: usize,
    pub source: String,
}

/// A video frame captured by the player, as base64 or a data URL.
#[derive(Debug, Deserialize, Validate)]
pub struct SnapshotRequest {
    #[garde(length(min = 1))]
    pub image_data: String,

    #[serde(default)]
    #[garde(skip)]
    pub video_url: String,

    #[serde(default)]
    #[garde(range(min = 0.0))]
    pub timestamp: f64,

    #[serde(default)]
    #[garde(length(max = 200))]
    pub title: String,
}

/// A short slice of recorded audio, as base64 or a data URL.
#[derive(Debug, Deserialize, Validate)]
pub struct AudioChunkRequest {
    #[garde(length(min = 1))]
    pub audio_data: String,

    #[serde(default)]
    #[garde(range(min = 0.0))]
    pub timestamp: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SnippetRequest {
    #[garde(length(min = 1, max = 20000))]
    pub text: String,
}
