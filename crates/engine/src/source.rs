use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::job::{Job, JobState};
use vidscribe_subtitles::CaptionEntry;

/// One member of an expanded playlist, in playlist order.
#[derive(Debug, Clone)]
pub struct PlaylistItem {
    pub video_id: String,
    pub title: String,
}

/// What a speech-to-text backend produced for an audio file.
#[derive(Debug, Clone)]
pub enum SpeechTranscript {
    /// Timed segments, one caption entry each.
    Segments(Vec<CaptionEntry>),
    /// Raw text without timing; the engine synthesizes fixed-duration
    /// entries from it.
    PlainText(String),
}

/// Contract for the video platform collaborator (the yt-dlp shaped thing).
#[async_trait]
pub trait VideoSource: Send + Sync + 'static {
    /// Resolves a user-supplied reference (watch URL, short URL, bare id)
    /// to a stable content id.
    async fn resolve_id(&self, reference: &str) -> anyhow::Result<String>;

    /// Fetches platform captions for the video as a WebVTT document.
    /// `Ok(None)` means no captions exist for the requested language.
    async fn fetch_captions(
        &self,
        video_id: &str,
        language: Option<&str>,
    ) -> anyhow::Result<Option<String>>;

    /// Downloads the audio track and returns the local file path.
    async fn download_audio(&self, video_id: &str) -> anyhow::Result<PathBuf>;

    /// Expands a playlist reference into its member videos, in order.
    async fn expand_playlist(&self, reference: &str) -> anyhow::Result<Vec<PlaylistItem>>;
}

/// Contract for the speech-to-text collaborator.
#[async_trait]
pub trait SpeechToTextBackend: Send + Sync + 'static {
    /// Transcribes an audio file. An absent language hint means
    /// auto-detect.
    async fn transcribe(
        &self,
        audio: &Path,
        language_hint: Option<&str>,
    ) -> anyhow::Result<SpeechTranscript>;

    /// Human-readable backend name, used in logs and error messages.
    fn name(&self) -> &str;
}

/// Optional best-effort notifications to the surrounding application
/// (usage records, dashboards). Failures are logged and swallowed; they
/// never affect the job itself.
#[async_trait]
pub trait PersistentTracker: Send + Sync + 'static {
    async fn record_job_start(&self, job: &Job) -> anyhow::Result<()>;

    async fn record_job_outcome(
        &self,
        job_id: &str,
        state: JobState,
        error: Option<&str>,
    ) -> anyhow::Result<()>;
}
