use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{
    download_track, select_track, ExtractError, PlayerResponse, Transcript, TranscriptSource,
    BROWSER_USER_AGENT,
};
use crate::services::video_ref::VideoRef;

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";

/// Reads caption tracks from the player response embedded in the public watch page.
pub struct WatchPageCaptions {
    http: reqwest::Client,
    languages: Vec<String>,
}

impl WatchPageCaptions {
    pub fn new(http: reqwest::Client, languages: Vec<String>) -> Self {
        Self { http, languages }
    }

    async fn fetch_watch_page(&self, video: &VideoRef) -> Result<String, ExtractError> {
        let response = self
            .http
            .get(format!("{}&hl=en", video.watch_url()))
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            // Skips the EU consent interstitial.
            .header(reqwest::header::COOKIE, "CONSENT=YES+1")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Status {
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for WatchPageCaptions {
    fn name(&self) -> &'static str {
        "watch_page_captions"
    }

    async fn fetch(&self, video: &VideoRef) -> Result<Transcript, ExtractError> {
        let html = self.fetch_watch_page(video).await?;
        let (tracks, title) = player_response_from_html(&html)?.into_tracks()?;

        let track = select_track(&tracks, &self.languages).ok_or(ExtractError::NoCaptions)?;
        tracing::debug!(
            video_id = %video,
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track from watch page"
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

/// Find the `ytInitialPlayerResponse` assignment among the page scripts and parse it.
pub(crate) fn player_response_from_html(html: &str) -> Result<PlayerResponse, ExtractError> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("script").map_err(|e| ExtractError::Parse(e.to_string()))?;

    for script in document.select(&selector) {
        let body: String = script.text().collect();
        let Some(marker) = body.find(PLAYER_RESPONSE_MARKER) else {
            continue;
        };
        let Some(json) = extract_json_object(&body[marker..]) else {
            continue;
        };

        return serde_json::from_str(json).map_err(|e| ExtractError::Parse(e.to_string()));
    }

    Err(ExtractError::Parse(
        "player response not found in watch page".to_string(),
    ))
}

/// The first balanced `{ ... }` in `text`, honouring JSON string escapes.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_with_braces_in_strings() {
        let text = r#"ytInitialPlayerResponse = {"a": "}{", "b": {"c": "\"}"}};var meta = {};"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"a": "}{", "b": {"c": "\"}"}}"#)
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{ unterminated"), None);
    }

    #[test]
    fn test_player_response_from_html() {
        let html = r#"<html><head>
<script>var ytcfg = {"x": 1};</script>
<script nonce="abc">var ytInitialPlayerResponse = {"playabilityStatus":{"status":"OK"},"videoDetails":{"title":"Q3 Earnings Call"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=E7wUGafs0LY&lang=en","languageCode":"en","kind":"asr"}]}}};var meta = document.createElement('meta');</script>
</head><body></body></html>"#;

        let response = player_response_from_html(html).unwrap();
        let (tracks, title) = response.into_tracks().unwrap();
        assert_eq!(title.as_deref(), Some("Q3 Earnings Call"));
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].is_generated());
    }

    #[test]
    fn test_missing_player_response() {
        let html = "<html><script>var other = {};</script></html>";
        assert!(matches!(
            player_response_from_html(html),
            Err(ExtractError::Parse(_))
        ));
    }
}
