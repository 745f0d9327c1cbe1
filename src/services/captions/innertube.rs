use async_trait::async_trait;
use serde_json::json;

use super::{
    download_track, select_track, ExtractError, PlayerResponse, Transcript, TranscriptSource,
};
use crate::services::video_ref::VideoRef;

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player?prettyPrint=false";
const ANDROID_CLIENT_VERSION: &str = "19.09.37";

/// Asks the player API for caption tracks while posing as the Android app, which is
/// served without the web page's bot checks more often than not.
pub struct InnertubeCaptions {
    http: reqwest::Client,
    languages: Vec<String>,
}

impl InnertubeCaptions {
    pub fn new(http: reqwest::Client, languages: Vec<String>) -> Self {
        Self { http, languages }
    }

    async fn player_response(&self, video: &VideoRef) -> Result<PlayerResponse, ExtractError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": ANDROID_CLIENT_VERSION,
                    "androidSdkVersion": 30,
                    "hl": "en",
                    "gl": "US"
                }
            },
            "videoId": video.id(),
            "contentCheckOk": true,
            "racyCheckOk": true
        });

        let response = self
            .http
            .post(PLAYER_ENDPOINT)
            .header(
                reqwest::header::USER_AGENT,
                format!("com.google.android.youtube/{ANDROID_CLIENT_VERSION} (Linux; U; Android 11) gzip"),
            )
            .header("X-YouTube-Client-Name", "3")
            .header("X-YouTube-Client-Version", ANDROID_CLIENT_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Status {
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TranscriptSource for InnertubeCaptions {
    fn name(&self) -> &'static str {
        "innertube_captions"
    }

    async fn fetch(&self, video: &VideoRef) -> Result<Transcript, ExtractError> {
        let (tracks, title) = self.player_response(video).await?.into_tracks()?;

        let track = select_track(&tracks, &self.languages).ok_or(ExtractError::NoCaptions)?;
        tracing::debug!(
            video_id = %video,
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track from player API"
        );

        let text = download_track(&self.http, track).await?;

        Ok(Transcript {
            text,
            source: self.name(),
            title,
            language: Some(track.language_code.clone()),
        })
    }
}
