use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use vidscribe_config::Settings;
use vidscribe_engine::batch::{GroupState, GroupStatus};
use vidscribe_engine::job::JobState;
use vidscribe_engine::service::{Status, TranscriptionService};
use vidscribe_engine::source::{PersistentTracker, SpeechToTextBackend, VideoSource};

use super::fake_platform::{FakeSpeechToText, FakeVideoSource, RecordingTracker};

/// A fully wired engine over fake collaborators, writing results into a
/// scratch directory that lives as long as the fixture.
pub struct TestEngine {
    pub service: Arc<TranscriptionService>,
    pub source: Arc<FakeVideoSource>,
    pub stt: Arc<FakeSpeechToText>,
    pub tracker: Arc<RecordingTracker>,
    pub output: TempDir,
}

impl TestEngine {
    pub fn spawn() -> Self {
        Self::spawn_with(FakeVideoSource::new(), |_| {})
    }

    pub fn spawn_with(
        source: FakeVideoSource,
        tweak: impl FnOnce(&mut Settings),
    ) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();

        let output = TempDir::new().expect("scratch dir");
        let mut settings = Settings::default();
        settings.output_dir = output.path().to_string_lossy().to_string();
        settings.max_concurrent_jobs = 2;
        settings.rate_limit_backoff_secs = 1;
        settings.stt_calls_per_minute = 100;
        tweak(&mut settings);

        let source = Arc::new(source);
        let stt = Arc::new(FakeSpeechToText::new());
        let tracker = Arc::new(RecordingTracker::new());

        let service = TranscriptionService::new(
            settings,
            Arc::clone(&source) as Arc<dyn VideoSource>,
            Arc::clone(&stt) as Arc<dyn SpeechToTextBackend>,
            Some(Arc::clone(&tracker) as Arc<dyn PersistentTracker>),
        );

        Self {
            service,
            source,
            stt,
            tracker,
            output,
        }
    }

    /// Polls a job until it reaches a terminal state.
    /// Returns (state, percent, error).
    pub async fn wait_terminal(&self, job_id: &str) -> (JobState, u8, Option<String>) {
        for _ in 0..500 {
            if let Ok(Status::Job { state, percent, error }) = self.service.get_status(job_id) {
                if state.is_terminal() {
                    return (state, percent, error);
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not reach a terminal state in time");
    }

    /// Polls a group until its aggregate state is `Complete`.
    pub async fn wait_group_complete(&self, group_id: &str) -> GroupStatus {
        for _ in 0..500 {
            if let Ok(Status::Group(status)) = self.service.get_status(group_id) {
                if status.state == GroupState::Complete {
                    return status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("group {group_id} did not complete in time");
    }
}
