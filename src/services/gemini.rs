use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::models::job::AnalysisContext;
use crate::models::report::VideoMetadata;

/// Gemini rejects `generateContent` bodies above this size.
pub const REQUEST_LIMIT_BYTES: usize = 20_000_000;

/// Room left for the JSON envelope and generation config.
const REQUEST_HEADROOM_BYTES: usize = 64 * 1024;

const FILE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const FILE_POLL_ATTEMPTS: u32 = 90;

const REPORT_PROMPT: &str = r#"You are an elite Executive Communication Coach. Evaluate the speaker's executive presence, credibility and communication effectiveness against global C-suite standards.

Return a strict JSON object with this EXACT structure (all fields present, scores are integers 0-100):
{
  "analysis_reliability": { "score": 90, "notice": "Why this analysis is or is not reliable." },
  "video_metadata": { "duration": "MM:SS", "published_date": "Unknown", "extracted_interviewee_name": "Name if stated" },
  "overall_performance": { "score": 85, "level": "Excellent", "summary": "Assessment of communication effectiveness.", "badge": "Top Performer" },
  "high_level_metrics": {
    "confidence": { "score": 90, "label": "Confidence" },
    "trustworthiness": { "score": 85, "label": "Trustworthiness" },
    "engagement": { "score": 80, "label": "Engagement" },
    "clarity": { "score": 85, "label": "Clarity" }
  },
  "detailed_analysis": {
    "voice_analysis": { "speaking_rate": "", "pause_frequency": "", "volume_variation": "", "clarity_rating": "", "observation": "" },
    "message_analysis": { "keyword_density": "", "emotional_tone": "", "structure_rating": "", "logic_flow": "", "observation": "" }
  },
  "emotion_radar": { "confidence": 0, "empathy": 0, "authority": 0, "composure": 0, "enthusiasm": 0, "trust": 0 },
  "timeline_analysis": [
    { "timestamp": "MM:SS", "event": "", "sentiment": "positive|neutral|negative", "emotion_label": "", "confidence_score": 0, "engagement_score": 0, "insight": "" }
  ],
  "benchmark_comparison": {
    "your_score": 0, "industry_average": 0, "top_ceos": 0,
    "metrics": ["Confidence", "Trustworthiness", "Engagement", "Clarity"],
    "emotion_radar_benchmark": { "confidence": 0, "empathy": 0, "authority": 0, "composure": 0, "enthusiasm": 0, "trust": 0 }
  },
  "recommendations": [
    { "title": "", "rationale": "", "strategy": "", "priority": "High|Medium|Low", "timeframe": "", "expected_impact": "" }
  ],
  "summary": "A detailed narrative summary of the performance."
}

Give 4-8 timeline entries and 2-5 recommendations. Write everything in English."#;

const SNAPSHOT_PROMPT: &str = r#"You are an executive presence coach looking at a single video frame of a speaker.
Return strict JSON: {"posture": "", "facial_expression": "", "eye_contact": "", "attire": "", "confidence_score": 0, "feedback": "One or two actionable sentences."}"#;

const AUDIO_CHUNK_PROMPT: &str = r#"You are a vocal delivery coach listening to a few seconds of an executive speaking.
Return strict JSON: {"pace": "", "tone": "", "energy": "", "filler_words": 0, "confidence_score": 0, "feedback": "One or two actionable sentences."}"#;

const SNIPPET_PROMPT: &str = r#"You are an executive communication coach reviewing a short passage of spoken text.
Return strict JSON: {"score": 0, "clarity": "", "persuasiveness": "", "feedback": "One or two actionable sentences."}"#;

/// Everything the report prompt says about the video besides its content.
#[derive(Debug, Clone, Default)]
pub struct CoachingBrief {
    pub context: AnalysisContext,
    pub metadata: Option<VideoMetadata>,
}

impl CoachingBrief {
    fn render(&self, medium: &str) -> String {
        let mut lines = vec![format!("Material: {medium}.")];
        let ctx = &self.context;
        let meta = self.metadata.as_ref();

        if let Some(title) = ctx
            .video_title
            .as_ref()
            .or_else(|| meta.and_then(|m| m.title.as_ref()))
        {
            lines.push(format!("Video title: {title}"));
        }
        if let Some(company) = &ctx.company {
            lines.push(format!("Company: {company}"));
        }
        if let Some(role) = &ctx.role {
            lines.push(format!("Speaker role: {role}"));
        }
        if let Some(target) = &ctx.target_person {
            lines.push(format!("Target audience: {target}"));
        }
        if let Some(meta) = meta {
            if let Some(author) = &meta.author {
                lines.push(format!("Channel: {author}"));
            }
            if let Some(date) = &meta.publish_date {
                lines.push(format!("Published: {date}"));
            }
            if let Some(secs) = meta.duration_seconds {
                lines.push(format!("Duration: {:02}:{:02}", secs / 60, secs % 60));
            }
        }

        format!("{REPORT_PROMPT}\n\n{}", lines.join("\n"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Gemini returned no content: {0}")]
    Empty(String),

    #[error("Failed to parse Gemini response as JSON: {0}")]
    Parse(String),

    #[error("Gemini file processing failed: {0}")]
    FileProcessing(String),
}

impl GeminiError {
    /// Whether trying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeminiError::Http(e) => e.is_timeout() || e.is_connect(),
            GeminiError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            GeminiError::FileProcessing(_) => true,
            GeminiError::Empty(_) | GeminiError::Parse(_) => false,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    name: String,
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

/// Client for the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        http: Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full coaching report from a transcript.
    pub async fn analyze_transcript(
        &self,
        transcript: &str,
        brief: &CoachingBrief,
    ) -> Result<Value, GeminiError> {
        let prompt = brief.render("a transcript of the speaker, included below");
        self.generate_json(vec![
            json!({ "text": prompt }),
            json!({ "text": format!("TRANSCRIPT:\n{transcript}") }),
        ])
        .await
    }

    /// Full coaching report from an audio recording.
    pub async fn analyze_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        brief: &CoachingBrief,
    ) -> Result<Value, GeminiError> {
        let prompt = brief.render(
            "an audio recording of the speaker; judge vocal delivery directly from the audio",
        );

        if fits_inline(audio.len(), &prompt) {
            return self
                .generate_json(vec![inline_part(audio, mime_type), json!({ "text": prompt })])
                .await;
        }

        tracing::info!(bytes = audio.len(), "Audio exceeds inline limit, uploading via Files API");
        let file = self.upload_file(audio, mime_type, "speech").await?;
        let result = match self.wait_until_active(&file).await {
            Ok(()) => {
                self.generate_json(vec![
                    json!({ "fileData": { "mimeType": mime_type, "fileUri": file.uri } }),
                    json!({ "text": prompt }),
                ])
                .await
            }
            Err(e) => Err(e),
        };

        self.delete_file(&file.name).await;
        result
    }

    /// Full coaching report with the model watching the video from its public URL.
    pub async fn analyze_video_uri(
        &self,
        uri: &str,
        brief: &CoachingBrief,
    ) -> Result<Value, GeminiError> {
        let prompt = brief.render("the attached video; judge both verbal and non-verbal delivery");
        self.generate_json(vec![
            json!({ "fileData": { "fileUri": uri } }),
            json!({ "text": prompt }),
        ])
        .await
    }

    /// Quick visual feedback on one frame.
    pub async fn analyze_snapshot(&self, image: &[u8], mime_type: &str) -> Result<Value, GeminiError> {
        self.generate_json(vec![
            inline_part(image, mime_type),
            json!({ "text": SNAPSHOT_PROMPT }),
        ])
        .await
    }

    /// Quick vocal feedback on a few seconds of audio.
    pub async fn analyze_audio_chunk(&self, audio: &[u8], mime_type: &str) -> Result<Value, GeminiError> {
        self.generate_json(vec![
            inline_part(audio, mime_type),
            json!({ "text": AUDIO_CHUNK_PROMPT }),
        ])
        .await
    }

    /// Quick feedback on a short passage of text.
    pub async fn analyze_snippet(&self, text: &str) -> Result<Value, GeminiError> {
        self.generate_json(vec![
            json!({ "text": SNIPPET_PROMPT }),
            json!({ "text": format!("PASSAGE:\n{text}") }),
        ])
        .await
    }

    async fn generate_json(&self, parts: Vec<Value>) -> Result<Value, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.4
            }
        });

        let start = Instant::now();
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        metrics::histogram!("gemini_request_seconds").record(start.elapsed().as_secs_f64());

        let text = response_text(parsed)?;
        tracing::debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "Gemini response received"
        );

        parse_model_json(&text)
    }

    async fn upload_file(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, GeminiError> {
        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;

        let status = start.status();
        if !status.is_success() {
            let body = start.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GeminiError::FileProcessing("missing upload URL".to_string()))?;

        let response = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        let file = response.json::<UploadResponse>().await?.file;
        tracing::info!(file = %file.name, mime = ?file.mime_type, "Uploaded media to Gemini");
        Ok(file)
    }

    /// Poll an uploaded file until Gemini has finished processing it.
    async fn wait_until_active(&self, uploaded: &UploadedFile) -> Result<(), GeminiError> {
        let mut state = uploaded.state.clone();

        for _ in 0..FILE_POLL_ATTEMPTS {
            match state.as_deref() {
                Some("ACTIVE") | None => return Ok(()),
                Some("FAILED") => {
                    return Err(GeminiError::FileProcessing(format!(
                        "{} failed processing",
                        uploaded.name
                    )))
                }
                _ => {}
            }

            tokio::time::sleep(FILE_POLL_INTERVAL).await;
            state = self.get_file(&uploaded.name).await?.state;
        }

        Err(GeminiError::FileProcessing(format!(
            "{} still processing after {} polls",
            uploaded.name, FILE_POLL_ATTEMPTS
        )))
    }

    async fn get_file(&self, name: &str) -> Result<UploadedFile, GeminiError> {
        let response = self
            .http
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    async fn delete_file(&self, name: &str) {
        let result = self
            .http
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(file = %name, "Deleted uploaded file");
            }
            Ok(response) => {
                tracing::warn!(file = %name, status = %response.status(), "Failed to delete uploaded file");
            }
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to delete uploaded file"),
        }
    }
}

/// Whether a payload still fits the request limit once base64 encoded next to the prompt.
fn fits_inline(payload_len: usize, prompt: &str) -> bool {
    payload_len.div_ceil(3) * 4 + prompt.len() + REQUEST_HEADROOM_BYTES <= REQUEST_LIMIT_BYTES
}

fn inline_part(bytes: &[u8], mime_type: &str) -> Value {
    json!({
        "inlineData": {
            "mimeType": mime_type,
            "data": base64::engine::general_purpose::STANDARD.encode(bytes)
        }
    })
}

fn response_text(response: GenerateResponse) -> Result<String, GeminiError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GeminiError::Empty(format!("prompt blocked: {reason}")));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GeminiError::Empty("no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(GeminiError::Empty(format!("finish reason {reason}")));
    }

    Ok(text)
}

/// Parse model output that should be JSON but may arrive fenced or with chatter.
pub fn parse_model_json(text: &str) -> Result<Value, GeminiError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```").trim());
    if let Some(inner) = unfenced {
        if let Ok(value) = serde_json::from_str(inner) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    let preview: String = trimmed.chars().take(200).collect();
    Err(GeminiError::Parse(preview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::extract::{DefaultBodyLimit, State};
    use axum::http::{Method, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    /// Request seen by the local Gemini stand-in: method, path, body size.
    type Seen = (Method, String, usize);

    #[derive(Clone)]
    struct FakeGemini {
        base_url: String,
        file_state: &'static str,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    async fn fake_gemini(
        State(fake): State<FakeGemini>,
        method: Method,
        uri: Uri,
        body: Bytes,
    ) -> Response {
        let path = uri.path().to_string();
        fake.seen
            .lock()
            .unwrap()
            .push((method.clone(), path.clone(), body.len()));

        let file = json!({
            "name": "files/speech-1",
            "uri": format!("{}/v1beta/files/speech-1", fake.base_url),
            "mimeType": "audio/mp4",
            "state": fake.file_state
        });

        if path == "/upload/v1beta/files" {
            let session = format!("{}/upload-session", fake.base_url);
            ([("x-goog-upload-url", session)], Json(json!({}))).into_response()
        } else if path == "/upload-session" {
            Json(json!({ "file": file })).into_response()
        } else if path.ends_with(":generateContent") {
            Json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"summary\": \"ok\"}" }] },
                    "finishReason": "STOP"
                }]
            }))
            .into_response()
        } else if method == Method::GET {
            Json(file).into_response()
        } else {
            Json(json!({})).into_response()
        }
    }

    async fn spawn_fake_gemini(file_state: &'static str) -> (GeminiClient, Arc<Mutex<Vec<Seen>>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let fake = FakeGemini {
            base_url: base_url.clone(),
            file_state,
            seen: seen.clone(),
        };
        let app = Router::new()
            .fallback(fake_gemini)
            .layer(DefaultBodyLimit::disable())
            .with_state(fake);
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = GeminiClient::new(Client::new(), "test-key", "gemini-2.0-flash", base_url);
        (client, seen)
    }

    fn paths(seen: &Arc<Mutex<Vec<Seen>>>) -> Vec<(Method, String)> {
        seen.lock()
            .unwrap()
            .iter()
            .map(|(m, p, _)| (m.clone(), p.clone()))
            .collect()
    }

    #[test]
    fn test_inline_limit_counts_base64_growth() {
        let prompt = "p".repeat(4000);
        assert!(fits_inline(1024, &prompt));
        assert!(fits_inline(14 * 1024 * 1024, &prompt));
        assert!(!fits_inline(15 * 1024 * 1024, &prompt));
        assert!(!fits_inline(17 * 1024 * 1024, &prompt));
    }

    #[tokio::test]
    async fn test_short_audio_sent_inline() {
        let (client, seen) = spawn_fake_gemini("ACTIVE").await;

        let report = client
            .analyze_audio(&[7u8; 1024], "audio/mp4", &CoachingBrief::default())
            .await
            .unwrap();

        assert_eq!(report["summary"], "ok");
        assert_eq!(
            paths(&seen),
            vec![(
                Method::POST,
                "/v1beta/models/gemini-2.0-flash:generateContent".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_hour_long_audio_goes_through_files_api() {
        let (client, seen) = spawn_fake_gemini("ACTIVE").await;
        let audio = vec![0u8; 17 * 1024 * 1024];

        let report = client
            .analyze_audio(&audio, "audio/mp4", &CoachingBrief::default())
            .await
            .unwrap();
        assert_eq!(report["summary"], "ok");

        assert_eq!(
            paths(&seen),
            vec![
                (Method::POST, "/upload/v1beta/files".to_string()),
                (Method::POST, "/upload-session".to_string()),
                (
                    Method::POST,
                    "/v1beta/models/gemini-2.0-flash:generateContent".to_string()
                ),
                (Method::DELETE, "/v1beta/files/speech-1".to_string()),
            ]
        );

        let generate_body = seen.lock().unwrap()[2].2;
        assert!(generate_body < 1024 * 1024, "generate body was {generate_body} bytes");
    }

    #[tokio::test]
    async fn test_failed_upload_is_still_deleted() {
        let (client, seen) = spawn_fake_gemini("FAILED").await;
        let audio = vec![0u8; 16 * 1024 * 1024];

        let err = client
            .analyze_audio(&audio, "audio/mp4", &CoachingBrief::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::FileProcessing(_)));

        let paths = paths(&seen);
        assert!(!paths.iter().any(|(_, p)| p.ends_with(":generateContent")));
        assert_eq!(
            paths.last(),
            Some(&(Method::DELETE, "/v1beta/files/speech-1".to_string()))
        );
    }

    #[test]
    fn test_parse_plain_json() {
        let value = parse_model_json(r#" {"summary": "ok"} "#).unwrap();
        assert_eq!(value["summary"], "ok");
    }

    #[test]
    fn test_parse_fenced_json() {
        let value = parse_model_json("```json\n{\"score\": 88}\n```").unwrap();
        assert_eq!(value["score"], 88);

        let value = parse_model_json("```\n{\"score\": 70}\n```\n").unwrap();
        assert_eq!(value["score"], 70);
    }

    #[test]
    fn test_parse_json_with_chatter() {
        let value =
            parse_model_json("Here is the analysis:\n{\"overall\": {\"score\": 81}}\nHope it helps!")
                .unwrap();
        assert_eq!(value["overall"]["score"], 81);
    }

    #[test]
    fn test_parse_failure() {
        assert!(matches!(
            parse_model_json("I cannot analyze this video."),
            Err(GeminiError::Parse(_))
        ));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":" }, { "text": " 1}" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_response_text_blocked_or_empty() {
        let blocked: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert!(matches!(response_text(blocked), Err(GeminiError::Empty(m)) if m.contains("SAFETY")));

        let empty: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "RECITATION" }]
        }))
        .unwrap();
        assert!(matches!(response_text(empty), Err(GeminiError::Empty(m)) if m.contains("RECITATION")));
    }

    #[test]
    fn test_retryable_classification() {
        let rate_limited = GeminiError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        let bad_request = GeminiError::Api {
            status: StatusCode::BAD_REQUEST,
            body: String::new(),
        };
        assert!(rate_limited.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!GeminiError::Parse(String::new()).is_retryable());
    }

    #[test]
    fn test_brief_includes_context_and_metadata() {
        let brief = CoachingBrief {
            context: AnalysisContext {
                video_title: None,
                company: Some("Acme".to_string()),
                role: Some("CFO".to_string()),
                target_person: Some("Investors".to_string()),
            },
            metadata: Some(VideoMetadata {
                title: Some("Q3 Earnings".to_string()),
                duration_seconds: Some(525),
                ..Default::default()
            }),
        };

        let prompt = brief.render("a transcript");
        assert!(prompt.starts_with("You are an elite Executive Communication Coach"));
        assert!(prompt.contains("Video title: Q3 Earnings"));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Target audience: Investors"));
        assert!(prompt.contains("Duration: 08:45"));
    }
}
