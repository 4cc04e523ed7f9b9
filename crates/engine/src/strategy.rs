use std::sync::Arc;

use tracing::{info, warn};

use crate::error::EngineError;
use crate::job::{JobProgress, JobState, Mode};
use crate::rate_limit::RateLimiter;
use crate::source::{SpeechToTextBackend, SpeechTranscript, VideoSource};
use vidscribe_subtitles::{chunk_text, parse_vtt, CaptionEntry};

/// Two-source transcript resolution: platform captions first, speech-to-text
/// as fallback.
///
/// Captions always win over speech-to-text in `auto` mode regardless of
/// quality, because they are free and not subject to the provider rate
/// limit. The speech-to-text path acquires a rate-limiter permit after the
/// audio download, so a stalled admission never holds a half-downloaded
/// file hostage to a later retry.
pub struct FallbackStrategy {
    source: Arc<dyn VideoSource>,
    stt: Arc<dyn SpeechToTextBackend>,
    limiter: Arc<RateLimiter>,
    chunk_words_per_entry: usize,
    chunk_entry_duration_secs: f64,
}

impl FallbackStrategy {
    pub fn new(
        source: Arc<dyn VideoSource>,
        stt: Arc<dyn SpeechToTextBackend>,
        limiter: Arc<RateLimiter>,
        chunk_words_per_entry: usize,
        chunk_entry_duration_secs: f64,
    ) -> Self {
        Self {
            source,
            stt,
            limiter,
            chunk_words_per_entry,
            chunk_entry_duration_secs,
        }
    }

    /// Resolves a canonical caption sequence for a video, advancing the
    /// job through `ExtractingSource` and `Transcribing` as it goes.
    pub async fn resolve_transcript(
        &self,
        video_id: &str,
        mode: Mode,
        language: Option<&str>,
        progress: &JobProgress<'_>,
    ) -> Result<Vec<CaptionEntry>, EngineError> {
        progress.advance(JobState::ExtractingSource);

        if mode.allows_captions() {
            match self.try_captions(video_id, language).await? {
                Some(entries) => {
                    info!(%video_id, entries = entries.len(), "using platform captions");
                    // The store only accepts exact next-state moves, so the
                    // captions path still walks through Transcribing on its
                    // way to SavingResults.
                    progress.advance(JobState::Transcribing);
                    return Ok(entries);
                }
                None if mode == Mode::Captions => {
                    return Err(EngineError::SourceUnavailable(
                        "no captions available".to_string(),
                    ));
                }
                None => {
                    info!(%video_id, "no captions, falling back to speech-to-text");
                }
            }
        }

        progress.advance(JobState::Transcribing);
        self.try_speech_to_text(video_id, mode, language).await
    }

    /// Attempts the captions source. Fetch errors are treated the same as
    /// absent captions so that `auto` mode can still fall through.
    async fn try_captions(
        &self,
        video_id: &str,
        language: Option<&str>,
    ) -> Result<Option<Vec<CaptionEntry>>, EngineError> {
        let vtt = match self.source.fetch_captions(video_id, language).await {
            Ok(Some(vtt)) => vtt,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(%video_id, error = %e, "caption fetch failed");
                return Ok(None);
            }
        };

        let entries = parse_vtt(&vtt)?;
        if entries.is_empty() {
            warn!(%video_id, "caption document parsed to zero entries");
            return Ok(None);
        }
        Ok(Some(entries))
    }

    async fn try_speech_to_text(
        &self,
        video_id: &str,
        mode: Mode,
        language: Option<&str>,
    ) -> Result<Vec<CaptionEntry>, EngineError> {
        let audio = self
            .source
            .download_audio(video_id)
            .await
            .map_err(|e| EngineError::SourceUnavailable(format!("audio download failed: {e}")))?;

        self.limiter.acquire().await;

        info!(%video_id, backend = self.stt.name(), "invoking speech-to-text");
        let transcript = self
            .stt
            .transcribe(&audio, language)
            .await
            .map_err(|e| self.stt_failure(mode, &e.to_string()))?;

        let entries = match transcript {
            SpeechTranscript::Segments(entries) => entries,
            SpeechTranscript::PlainText(text) => chunk_text(
                &text,
                self.chunk_words_per_entry,
                self.chunk_entry_duration_secs,
            ),
        };

        if entries.is_empty() {
            return Err(EngineError::TranscriptionFailed(
                "no transcription source succeeded".to_string(),
            ));
        }
        Ok(entries)
    }

    /// Stage-qualified failure message: in `auto` mode the caption attempt
    /// already came up empty, and the message says so.
    fn stt_failure(&self, mode: Mode, cause: &str) -> EngineError {
        let message = if mode == Mode::Auto {
            format!("no captions and speech-to-text failed: {cause}")
        } else {
            format!("speech-to-text failed: {cause}")
        };
        EngineError::TranscriptionFailed(message)
    }
}
