use vidscribe_subtitles::SubtitleError;

/// Terminal errors recorded on a job or returned to callers.
///
/// Rate-limiter denial is deliberately absent: admission is retried inside
/// [`crate::rate_limit::RateLimiter::acquire`] and never surfaces as a job
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Captions or audio could not be obtained from the platform.
    #[error("{0}")]
    SourceUnavailable(String),

    /// The speech-to-text backend failed or produced nothing usable.
    #[error("{0}")]
    TranscriptionFailed(String),

    /// Caption data that reached the codec was malformed. The fallback
    /// strategy normalizes both sources first, so this indicates a bug.
    #[error("malformed caption data: {0}")]
    Format(#[from] SubtitleError),

    /// Rendering succeeded but the result files could not be written.
    #[error("failed to save results: {0}")]
    SaveFailed(String),

    /// Unknown job or group id.
    #[error("not found: {0}")]
    NotFound(String),
}
