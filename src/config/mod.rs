use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for job queue
    pub redis_url: String,

    /// Gemini API key
    pub gemini_api_key: String,

    /// Gemini model used for every analysis call
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Base URL of the Generative Language REST API
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// YouTube Data API key. Metadata falls back to yt-dlp when unset.
    #[serde(default)]
    pub youtube_api_key: Option<String>,

    #[serde(default = "default_yt_dlp_bin")]
    pub yt_dlp_bin: String,

    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    /// Scratch directory for downloaded media and subtitles
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Netscape cookie jar handed to yt-dlp (helps with bot checks)
    #[serde(default)]
    pub ytdlp_cookies_file: Option<PathBuf>,

    /// Comma-separated caption language preference, most preferred first
    #[serde(default = "default_caption_languages")]
    pub caption_languages: String,

    /// Timeout for outbound HTTP calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Timeout for a single Gemini call; long audio takes minutes
    #[serde(default = "default_gemini_timeout_secs")]
    pub gemini_timeout_secs: u64,

    /// Where the worker serves its Prometheus metrics
    #[serde(default = "default_worker_metrics_addr")]
    pub worker_metrics_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_yt_dlp_bin() -> String {
    "yt-dlp".to_string()
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("comms-coach")
}

fn default_caption_languages() -> String {
    "en".to_string()
}

fn default_http_timeout_secs() -> u64 {
    60
}

fn default_gemini_timeout_secs() -> u64 {
    300
}

fn default_worker_metrics_addr() -> String {
    "0.0.0.0:9091".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Caption languages as a trimmed, non-empty list.
    pub fn caption_languages(&self) -> Vec<String> {
        let langs: Vec<String> = self
            .caption_languages
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if langs.is_empty() {
            vec![default_caption_languages()]
        } else {
            langs
        }
    }
}
