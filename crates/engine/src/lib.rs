pub mod batch;
pub mod cache;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod rate_limit;
pub mod service;
pub mod source;
pub mod strategy;

pub use batch::{BatchCoordinator, GroupState, GroupStatus, MemberFailure};
pub use cache::{CacheKey, ResultCache};
pub use dispatcher::{Dispatcher, JobRunner};
pub use error::EngineError;
pub use job::{Job, JobState, JobStore, Mode};
pub use rate_limit::RateLimiter;
pub use service::{JobResult, Status, TranscriptionService};
pub use source::{
    PersistentTracker, PlaylistItem, SpeechToTextBackend, SpeechTranscript, VideoSource,
};
pub use strategy::FallbackStrategy;

use serde::{Deserialize, Serialize};

/// The rendered multi-format transcript for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptBundle {
    pub text: String,
    pub srt: String,
    pub vtt: String,
}

/// Output formats a caller can request a result in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    Text,
    Srt,
    Vtt,
}

impl TranscriptFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TranscriptFormat::Text => "txt",
            TranscriptFormat::Srt => "srt",
            TranscriptFormat::Vtt => "vtt",
        }
    }
}

impl TranscriptBundle {
    pub fn format(&self, format: TranscriptFormat) -> &str {
        match format {
            TranscriptFormat::Text => &self.text,
            TranscriptFormat::Srt => &self.srt,
            TranscriptFormat::Vtt => &self.vtt,
        }
    }
}
