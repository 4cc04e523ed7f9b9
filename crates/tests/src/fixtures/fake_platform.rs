use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use vidscribe_engine::job::{Job, JobState};
use vidscribe_engine::source::{
    PersistentTracker, PlaylistItem, SpeechToTextBackend, SpeechTranscript, VideoSource,
};

/// In-memory video platform: captions per video id, a configurable
/// playlist, and per-video failure switches. Call counters let tests assert
/// which paths were exercised.
pub struct FakeVideoSource {
    captions: DashMap<String, String>,
    playlist: Mutex<Vec<PlaylistItem>>,
    fail_resolve: Mutex<HashSet<String>>,
    fail_download: Mutex<HashSet<String>>,
    pub caption_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl FakeVideoSource {
    pub fn new() -> Self {
        Self {
            captions: DashMap::new(),
            playlist: Mutex::new(Vec::new()),
            fail_resolve: Mutex::new(HashSet::new()),
            fail_download: Mutex::new(HashSet::new()),
            caption_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_captions(self, video_id: &str, vtt: String) -> Self {
        self.captions.insert(video_id.to_string(), vtt);
        self
    }

    pub fn set_captions(&self, video_id: &str, vtt: String) {
        self.captions.insert(video_id.to_string(), vtt);
    }

    pub fn set_playlist(&self, items: Vec<PlaylistItem>) {
        *self.playlist.lock() = items;
    }

    pub fn fail_resolve_for(&self, reference: &str) {
        self.fail_resolve.lock().insert(reference.to_string());
    }

    pub fn fail_download_for(&self, video_id: &str) {
        self.fail_download.lock().insert(video_id.to_string());
    }
}

impl Default for FakeVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSource for FakeVideoSource {
    async fn resolve_id(&self, reference: &str) -> anyhow::Result<String> {
        if self.fail_resolve.lock().contains(reference) {
            bail!("video unavailable");
        }
        // Accept either a watch URL or a bare id.
        let id = reference
            .rsplit("v=")
            .next()
            .unwrap_or(reference)
            .to_string();
        Ok(id)
    }

    async fn fetch_captions(
        &self,
        video_id: &str,
        _language: Option<&str>,
    ) -> anyhow::Result<Option<String>> {
        self.caption_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(self.captions.get(video_id).map(|v| v.clone()))
    }

    async fn download_audio(&self, video_id: &str) -> anyhow::Result<PathBuf> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        if self.fail_download.lock().contains(video_id) {
            bail!("HTTP 403 from media endpoint");
        }
        Ok(PathBuf::from(format!("/tmp/fake-audio/{video_id}.mp3")))
    }

    async fn expand_playlist(&self, _reference: &str) -> anyhow::Result<Vec<PlaylistItem>> {
        Ok(self.playlist.lock().clone())
    }
}

/// Speech-to-text fake returning a configured transcript (plain text by
/// default) and counting invocations.
pub struct FakeSpeechToText {
    response: Mutex<SpeechTranscript>,
    fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeSpeechToText {
    pub fn new() -> Self {
        Self {
            response: Mutex::new(SpeechTranscript::PlainText(
                "one two three four five six seven eight nine ten eleven twelve".to_string(),
            )),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_response(&self, response: SpeechTranscript) {
        *self.response.lock() = response;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

impl Default for FakeSpeechToText {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechToTextBackend for FakeSpeechToText {
    async fn transcribe(
        &self,
        _audio: &Path,
        _language_hint: Option<&str>,
    ) -> anyhow::Result<SpeechTranscript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        if self.fail.load(Ordering::SeqCst) {
            bail!("model returned status 500");
        }
        Ok(self.response.lock().clone())
    }

    fn name(&self) -> &str {
        "fake-whisper"
    }
}

/// Tracker that records notifications, optionally erroring to verify the
/// best-effort contract.
pub struct RecordingTracker {
    pub starts: Mutex<Vec<String>>,
    pub outcomes: Mutex<Vec<(String, JobState, Option<String>)>>,
    fail: AtomicBool,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self {
            starts: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

impl Default for RecordingTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistentTracker for RecordingTracker {
    async fn record_job_start(&self, job: &Job) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("tracker database down");
        }
        self.starts.lock().push(job.id.clone());
        Ok(())
    }

    async fn record_job_outcome(
        &self,
        job_id: &str,
        state: JobState,
        error: Option<&str>,
    ) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("tracker database down");
        }
        self.outcomes
            .lock()
            .push((job_id.to_string(), state, error.map(str::to_string)));
        Ok(())
    }
}
