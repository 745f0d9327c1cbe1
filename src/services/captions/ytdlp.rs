use async_trait::async_trait;
use std::path::PathBuf;

use super::{flatten_vtt, non_empty_transcript, ExtractError, Transcript, TranscriptSource};
use crate::services::media::{pick_subtitle_file, scratch_dir, YtDlp};
use crate::services::video_ref::VideoRef;

/// Lets yt-dlp fetch manual or automatic subtitles without downloading media.
pub struct YtDlpSubtitles {
    ytdlp: YtDlp,
    work_dir: PathBuf,
    languages: Vec<String>,
}

impl YtDlpSubtitles {
    pub fn new(ytdlp: YtDlp, work_dir: PathBuf, languages: Vec<String>) -> Self {
        Self {
            ytdlp,
            work_dir,
            languages,
        }
    }
}

#[async_trait]
impl TranscriptSource for YtDlpSubtitles {
    fn name(&self) -> &'static str {
        "ytdlp_subtitles"
    }

    async fn fetch(&self, video: &VideoRef) -> Result<Transcript, ExtractError> {
        let dir = scratch_dir(&self.work_dir, "subs-").await?;
        self.ytdlp
            .download_subtitles(video, dir.path(), &self.languages)
            .await?;

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            files.push(entry.path());
        }

        let file = pick_subtitle_file(&files, &self.languages).ok_or(ExtractError::NoCaptions)?;
        let language = file
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit('.').next())
            .map(str::to_string);

        tracing::debug!(video_id = %video, file = %file.display(), "Read yt-dlp subtitles");

        let vtt = tokio::fs::read_to_string(&file).await?;
        let text = non_empty_transcript(flatten_vtt(&vtt))?;

        Ok(Transcript {
            text,
            source: self.name(),
            title: None,
            language,
        })
    }
}
