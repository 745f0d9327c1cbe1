//! Media retrieval through the `yt-dlp` and `ffmpeg` command-line tools.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;
use tokio::process::Command;

use crate::services::video_ref::VideoRef;

/// Longest slice of tool stderr kept in error messages.
const STDERR_TAIL: usize = 600;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {reason}")]
    Failed { tool: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {tool} output: {reason}")]
    Output { tool: String, reason: String },
}

async fn run(tool: &str, command: &mut Command) -> Result<Output, MediaError> {
    let output = command
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| MediaError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(MediaError::Failed {
            tool: tool.to_string(),
            reason: stderr_tail(&output.stderr),
        });
    }

    Ok(output)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let start = text
        .char_indices()
        .rev()
        .nth(STDERR_TAIL)
        .map(|(i, _)| i)
        .unwrap_or(0);
    text[start..].to_string()
}

/// Thin wrapper over the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: String,
    cookies_file: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(bin: impl Into<String>, cookies_file: Option<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            cookies_file,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--no-warnings")
            .arg("--no-playlist")
            .arg("--extractor-args")
            .arg("youtube:player_client=android,web");
        if let Some(cookies) = &self.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd
    }

    /// Write subtitle files (manual and automatic) for `languages` into `dir`.
    pub async fn download_subtitles(
        &self,
        video: &VideoRef,
        dir: &Path,
        languages: &[String],
    ) -> Result<(), MediaError> {
        let sub_langs = languages
            .iter()
            .map(|l| format!("{l}.*,{l}"))
            .collect::<Vec<_>>()
            .join(",");

        let mut cmd = self.command();
        cmd.arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(sub_langs)
            .arg("--sub-format")
            .arg("vtt")
            .arg("-o")
            .arg(dir.join("subs.%(ext)s"))
            .arg(video.watch_url());

        run(&self.bin, &mut cmd).await?;
        Ok(())
    }

    /// Download the best audio-only stream into `dir`, returning the file path.
    pub async fn download_audio(&self, video: &VideoRef, dir: &Path) -> Result<PathBuf, MediaError> {
        let mut cmd = self.command();
        cmd.arg("-f")
            .arg("bestaudio/best")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("-o")
            .arg(dir.join("source.%(ext)s"))
            .arg(video.watch_url());

        let output = run(&self.bin, &mut cmd).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| MediaError::Output {
                tool: self.bin.clone(),
                reason: "no output file reported".to_string(),
            })?;

        Ok(path)
    }

    /// Video info as reported by `--dump-json`.
    pub async fn dump_json(&self, video: &VideoRef) -> Result<serde_json::Value, MediaError> {
        let mut cmd = self.command();
        cmd.arg("--skip-download")
            .arg("--dump-json")
            .arg(video.watch_url());

        let output = run(&self.bin, &mut cmd).await?;
        serde_json::from_slice(&output.stdout).map_err(|e| MediaError::Output {
            tool: self.bin.clone(),
            reason: e.to_string(),
        })
    }
}

/// Thin wrapper over the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    bin: String,
}

impl Ffmpeg {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Re-encode to mono 16 kHz low-bitrate MP3. Speech stays intelligible and an
    /// hour of audio stays around 14 MB.
    pub async fn encode_speech_mp3(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-y")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg("16000")
            .arg("-b:a")
            .arg("32k")
            .arg(output);

        run(&self.bin, &mut cmd).await?;
        Ok(())
    }
}

/// A media file in a scratch directory that is removed on drop.
#[derive(Debug)]
pub struct MediaAsset {
    dir: TempDir,
    path: PathBuf,
    mime_type: &'static str,
}

impl MediaAsset {
    pub fn new(dir: TempDir, path: PathBuf, mime_type: &'static str) -> Self {
        Self {
            dir,
            path,
            mime_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub async fn read(&self) -> Result<Vec<u8>, MediaError> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Create a per-job scratch directory under `work_dir`.
pub async fn scratch_dir(work_dir: &Path, prefix: &str) -> Result<TempDir, MediaError> {
    tokio::fs::create_dir_all(work_dir).await?;
    Ok(tempfile::Builder::new().prefix(prefix).tempdir_in(work_dir)?)
}

/// Produces an audio asset for a video. Step of the extraction chain that runs once
/// every caption source has failed.
#[async_trait]
pub trait MediaSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, video: &VideoRef) -> Result<MediaAsset, MediaError>;
}

/// Downloads the audio stream and re-encodes it for the model.
pub struct AudioDownloader {
    ytdlp: YtDlp,
    ffmpeg: Ffmpeg,
    work_dir: PathBuf,
}

impl AudioDownloader {
    pub fn new(ytdlp: YtDlp, ffmpeg: Ffmpeg, work_dir: PathBuf) -> Self {
        Self {
            ytdlp,
            ffmpeg,
            work_dir,
        }
    }
}

#[async_trait]
impl MediaSource for AudioDownloader {
    fn name(&self) -> &'static str {
        "audio_download"
    }

    async fn fetch(&self, video: &VideoRef) -> Result<MediaAsset, MediaError> {
        let dir = scratch_dir(&self.work_dir, "audio-").await?;

        tracing::info!(video_id = %video, dir = %dir.path().display(), "Downloading audio");
        let source = self.ytdlp.download_audio(video, dir.path()).await?;

        let encoded = dir.path().join("speech.mp3");
        self.ffmpeg.encode_speech_mp3(&source, &encoded).await?;

        if source != encoded {
            if let Err(e) = tokio::fs::remove_file(&source).await {
                tracing::debug!(error = %e, "Could not remove source media");
            }
        }

        Ok(MediaAsset::new(dir, encoded, "audio/mp3"))
    }
}

/// Language code of a `subs.<lang>.vtt` file written by yt-dlp.
fn subtitle_lang(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()?.rsplit('.').next()
}

/// The `.vtt` file among `files`, preferring the given languages in order.
pub(crate) fn pick_subtitle_file(files: &[PathBuf], languages: &[String]) -> Option<PathBuf> {
    let vtt: Vec<&PathBuf> = files
        .iter()
        .filter(|p| p.extension().and_then(OsStr::to_str) == Some("vtt"))
        .collect();

    for lang in languages {
        let hit = vtt.iter().copied().find(|path| {
            subtitle_lang(path).is_some_and(|code| {
                code == lang.as_str()
                    || code
                        .strip_prefix(lang.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            })
        });
        if let Some(path) = hit {
            return Some(path.clone());
        }
    }

    vtt.first().map(|path| (*path).clone())
}
