use std::time::Duration;

use vidscribe_engine::error::EngineError;
use vidscribe_engine::job::{JobState, Mode};
use vidscribe_engine::service::{JobResult, Status};
use vidscribe_engine::TranscriptFormat;

use crate::fixtures::fake_platform::FakeVideoSource;
use crate::fixtures::sample_vtt;
use crate::fixtures::test_engine::TestEngine;

fn state_index(state: JobState) -> usize {
    match state {
        JobState::Queued => 0,
        JobState::Downloading => 1,
        JobState::ExtractingSource => 2,
        JobState::Transcribing => 3,
        JobState::SavingResults => 4,
        JobState::Complete => 5,
        JobState::Failed => usize::MAX,
    }
}

#[tokio::test]
async fn observed_progress_is_monotone_and_states_follow_the_chain() {
    let engine = TestEngine::spawn();

    let job_id = engine.service.submit("vid-slow", Mode::Auto, None).await.unwrap();

    let mut observations = Vec::new();
    for _ in 0..2000 {
        let Ok(Status::Job { state, percent, .. }) = engine.service.get_status(&job_id) else {
            panic!("status must always be answerable");
        };
        observations.push((state, percent));
        if state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let (final_state, final_percent) = *observations.last().unwrap();
    assert_eq!(final_state, JobState::Complete);
    assert_eq!(final_percent, 100);

    for window in observations.windows(2) {
        let (prev_state, prev_percent) = window[0];
        let (next_state, next_percent) = window[1];
        assert!(next_percent >= prev_percent, "percent regressed");
        assert!(
            state_index(next_state) >= state_index(prev_state),
            "state moved backwards: {prev_state:?} -> {next_state:?}"
        );
    }
}

#[tokio::test]
async fn captions_success_reaches_complete_with_valid_state_chain() {
    let source = FakeVideoSource::new().with_captions("vid-caps", sample_vtt());
    let engine = TestEngine::spawn_with(source, |_| {});

    let job_id = engine.service.submit("vid-caps", Mode::Auto, Some("en")).await.unwrap();

    let mut observations = Vec::new();
    for _ in 0..2000 {
        let Ok(Status::Job { state, percent, .. }) = engine.service.get_status(&job_id) else {
            panic!("status must always be answerable");
        };
        observations.push((state, percent));
        if state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // The captions path must not stall in an intermediate state: it walks
    // the same chain as the speech-to-text path and terminates.
    let (final_state, final_percent) = *observations.last().unwrap();
    assert_eq!(final_state, JobState::Complete);
    assert_eq!(final_percent, 100);
    for window in observations.windows(2) {
        assert!(window[1].1 >= window[0].1, "percent regressed");
        assert!(state_index(window[1].0) >= state_index(window[0].0));
    }
}

#[tokio::test]
async fn result_is_not_ready_before_completion_and_never_for_failures() {
    let engine = TestEngine::spawn();
    engine.stt.set_failing(true);

    let job_id = engine
        .service
        .submit("vid-fail", Mode::SpeechText, None)
        .await
        .unwrap();

    let (state, _, _) = engine.wait_terminal(&job_id).await;
    assert_eq!(state, JobState::Failed);

    // Status stays well-formed for failed jobs, result stays unavailable.
    let status = engine.service.get_status(&job_id).unwrap();
    assert!(matches!(status, Status::Job { state: JobState::Failed, .. }));
    let result = engine.service.get_result(&job_id, TranscriptFormat::Text).unwrap();
    assert_eq!(result, JobResult::NotReady);
}

#[tokio::test]
async fn unknown_ids_return_not_found() {
    let engine = TestEngine::spawn();

    assert!(matches!(
        engine.service.get_status("nope"),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.service.get_result("nope", TranscriptFormat::Srt),
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn completed_job_writes_all_three_formats_to_disk() {
    let source = FakeVideoSource::new().with_captions("vid-disk", sample_vtt());
    let engine = TestEngine::spawn_with(source, |_| {});

    let job_id = engine.service.submit("vid-disk", Mode::Auto, None).await.unwrap();
    let (state, _, _) = engine.wait_terminal(&job_id).await;
    assert_eq!(state, JobState::Complete);

    let dir = engine.output.path().join(&job_id);
    for ext in ["txt", "srt", "vtt"] {
        let path = dir.join(format!("vid-disk.{ext}"));
        assert!(path.exists(), "missing {}", path.display());
    }

    let vtt = std::fs::read_to_string(dir.join("vid-disk.vtt")).unwrap();
    assert!(vtt.starts_with("WEBVTT"));
}
