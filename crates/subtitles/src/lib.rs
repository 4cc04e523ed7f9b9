pub mod chunk;
pub mod render;
pub mod srt;
pub mod timestamp;
pub mod vtt;

pub use chunk::chunk_text;
pub use render::{render_srt, render_text, render_vtt};
pub use srt::parse_srt;
pub use timestamp::{format_srt_time, format_vtt_time, parse_timestamp};
pub use vtt::parse_vtt;

use serde::{Deserialize, Serialize};

/// A single caption span, the canonical intermediate transcript unit.
///
/// Both the captions path and the speech-to-text path are normalized into
/// an ordered `Vec<CaptionEntry>` (sorted by start, no overlaps) before any
/// format rendering happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Start offset in seconds from the beginning of the media.
    pub start_secs: f64,
    /// End offset in seconds, always >= `start_secs`.
    pub end_secs: f64,
    pub text: String,
}

impl CaptionEntry {
    pub fn new(start_secs: f64, end_secs: f64, text: impl Into<String>) -> Self {
        Self {
            start_secs,
            end_secs,
            text: text.into(),
        }
    }
}

/// Errors from timestamp normalization and subtitle parsing.
#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("malformed cue at line {line}: {reason}")]
    MalformedCue { line: usize, reason: String },
}
