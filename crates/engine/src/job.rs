use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::TranscriptBundle;

/// Transcript source selection for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Captions first, speech-to-text as fallback.
    Auto,
    /// Platform captions only; fail if none exist.
    Captions,
    /// Speech-to-text only.
    SpeechText,
}

impl Mode {
    pub fn allows_captions(self) -> bool {
        matches!(self, Mode::Auto | Mode::Captions)
    }

    pub fn allows_speech_to_text(self) -> bool {
        matches!(self, Mode::Auto | Mode::SpeechText)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Captions => "captions",
            Mode::SpeechText => "speechtext",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle states. Transitions only move forward through the
/// declaration order, except that `Failed` is reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Downloading,
    ExtractingSource,
    Transcribing,
    SavingResults,
    Complete,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed)
    }

    /// Progress checkpoint assigned when a job enters this state.
    pub fn checkpoint_percent(self) -> u8 {
        match self {
            JobState::Queued => 0,
            JobState::Downloading => 10,
            JobState::ExtractingSource => 25,
            JobState::Transcribing => 40,
            JobState::SavingResults => 90,
            JobState::Complete => 100,
            // Failed freezes at the last checkpoint; this value is unused.
            JobState::Failed => 0,
        }
    }

    /// The state that follows this one in the success path.
    pub fn next(self) -> Option<JobState> {
        match self {
            JobState::Queued => Some(JobState::Downloading),
            JobState::Downloading => Some(JobState::ExtractingSource),
            JobState::ExtractingSource => Some(JobState::Transcribing),
            JobState::Transcribing => Some(JobState::SavingResults),
            JobState::SavingResults => Some(JobState::Complete),
            JobState::Complete | JobState::Failed => None,
        }
    }
}

/// One unit of work: transcribing a single video reference.
///
/// Mutated only by the worker executing it; everyone else reads cloned
/// snapshots out of the [`JobStore`].
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: String,
    /// Resolved platform content id.
    pub video_id: String,
    /// The reference the caller originally submitted.
    pub reference: String,
    /// Display title, when known (playlist members carry one).
    pub title: Option<String>,
    pub mode: Mode,
    /// Requested language tag; `None` means auto-detect.
    pub language: Option<String>,
    pub state: JobState,
    pub percent: u8,
    pub error: Option<String>,
    /// Batch group this job belongs to, if it was part of a fan-out.
    pub group_id: Option<String>,
    /// Set only once the job reaches `Complete`.
    pub result: Option<TranscriptBundle>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(
        id: String,
        video_id: String,
        reference: String,
        title: Option<String>,
        mode: Mode,
        language: Option<String>,
        group_id: Option<String>,
    ) -> Self {
        Self {
            id,
            video_id,
            reference,
            title,
            mode,
            language,
            state: JobState::Queued,
            percent: 0,
            error: None,
            group_id,
            result: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Concurrent job registry with copy-on-read snapshots.
///
/// Transition methods enforce the state machine: strictly forward moves,
/// `Failed` from any non-terminal state, and at most one terminal
/// transition per job. Invalid moves are logged and dropped rather than
/// panicking, since a racing status reader must never observe a torn state.
pub struct JobStore {
    jobs: DashMap<String, Job>,
}

impl JobStore {
    pub fn new() -> Self {
        Self { jobs: DashMap::new() }
    }

    pub fn insert(&self, job: Job) {
        self.jobs.insert(job.id.clone(), job);
    }

    /// Returns a consistent snapshot of a job, or `None` for unknown ids.
    pub fn snapshot(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|j| j.clone())
    }

    pub fn snapshots(&self, ids: &[String]) -> Vec<Job> {
        ids.iter().filter_map(|id| self.snapshot(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Advances a job to the next success-path state.
    ///
    /// The transition is applied atomically under the map entry lock, so
    /// readers see either the old or the new snapshot, never a mix.
    pub fn advance(&self, id: &str, state: JobState) {
        let Some(mut job) = self.jobs.get_mut(id) else {
            warn!(%id, "advance on unknown job");
            return;
        };
        if job.state.next() != Some(state) || state.is_terminal() {
            warn!(%id, from = ?job.state, to = ?state, "invalid job transition dropped");
            return;
        }
        job.state = state;
        job.percent = job.percent.max(state.checkpoint_percent());
        debug!(%id, state = ?state, percent = job.percent, "job advanced");
    }

    /// Marks a job complete with its result bundle. Only valid from
    /// `SavingResults`.
    pub fn complete(&self, id: &str, bundle: TranscriptBundle) {
        let Some(mut job) = self.jobs.get_mut(id) else {
            warn!(%id, "complete on unknown job");
            return;
        };
        if job.state != JobState::SavingResults {
            warn!(%id, state = ?job.state, "complete dropped, job not in SavingResults");
            return;
        }
        job.state = JobState::Complete;
        job.percent = 100;
        job.result = Some(bundle);
        job.completed_at = Some(Utc::now());
        debug!(%id, "job complete");
    }

    /// Marks a job failed with a human-readable cause. Progress freezes at
    /// the last checkpoint so that `percent == 100` holds only for
    /// `Complete`.
    pub fn fail(&self, id: &str, error: impl Into<String>) {
        let Some(mut job) = self.jobs.get_mut(id) else {
            warn!(%id, "fail on unknown job");
            return;
        };
        if job.state.is_terminal() {
            warn!(%id, state = ?job.state, "fail dropped, job already terminal");
            return;
        }
        job.state = JobState::Failed;
        job.error = Some(error.into());
        job.completed_at = Some(Utc::now());
        debug!(%id, error = job.error.as_deref(), "job failed");
    }

    /// Removes terminal jobs whose completion is older than the retention
    /// window. Returns the number of jobs dropped.
    pub fn sweep_retired(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::zero());
        let expired: Vec<String> = self
            .jobs
            .iter()
            .filter(|j| {
                j.state.is_terminal() && j.completed_at.is_some_and(|done| done < cutoff)
            })
            .map(|j| j.id.clone())
            .collect();
        for id in &expired {
            self.jobs.remove(id);
        }
        expired.len()
    }

    /// Spawns a periodic sweep that drops terminal jobs older than the
    /// retention window.
    pub fn spawn_retention_sweeper(self: &Arc<Self>, retention: Duration, interval: Duration) {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let swept = store.sweep_retired(retention);
                if swept > 0 {
                    debug!(count = swept, "swept retired jobs");
                }
            }
        });
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write handle a worker uses to publish state transitions for the one job
/// it has claimed.
pub struct JobProgress<'a> {
    store: &'a JobStore,
    job_id: &'a str,
}

impl<'a> JobProgress<'a> {
    pub fn new(store: &'a JobStore, job_id: &'a str) -> Self {
        Self { store, job_id }
    }

    pub fn advance(&self, state: JobState) {
        self.store.advance(self.job_id, state);
    }
}
