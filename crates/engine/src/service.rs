use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nanoid::nanoid;
use serde::Serialize;
use tracing::{info, warn};

use crate::batch::{BatchCoordinator, GroupStatus};
use crate::cache::{CacheKey, ResultCache};
use crate::dispatcher::{Dispatcher, JobRunner};
use crate::error::EngineError;
use crate::job::{Job, JobProgress, JobState, JobStore, Mode};
use crate::rate_limit::RateLimiter;
use crate::source::{PersistentTracker, SpeechToTextBackend, VideoSource};
use crate::strategy::FallbackStrategy;
use crate::{TranscriptBundle, TranscriptFormat};
use vidscribe_config::Settings;
use vidscribe_subtitles::{render_srt, render_text, render_vtt};

/// Status of a job or a batch group, always well-formed even for failures.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Status {
    Job {
        state: JobState,
        percent: u8,
        error: Option<String>,
    },
    Group(GroupStatus),
}

/// Outcome of a result query. `NotReady` covers every non-complete state,
/// so callers poll instead of blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Ready(String),
    NotReady,
}

/// The transcription engine facade: submission, status, and result
/// retrieval over the job store, dispatcher, cache, and batch coordinator.
///
/// Must be created inside a Tokio runtime; construction spawns the cache
/// and job-retention sweep tasks.
pub struct TranscriptionService {
    settings: Settings,
    store: Arc<JobStore>,
    cache: Arc<ResultCache>,
    dispatcher: Dispatcher,
    coordinator: BatchCoordinator,
    source: Arc<dyn VideoSource>,
}

impl TranscriptionService {
    pub fn new(
        settings: Settings,
        source: Arc<dyn VideoSource>,
        stt: Arc<dyn SpeechToTextBackend>,
        tracker: Option<Arc<dyn PersistentTracker>>,
    ) -> Arc<Self> {
        let store = Arc::new(JobStore::new());
        let cache = Arc::new(ResultCache::new(Duration::from_secs(settings.cache_ttl_secs)));
        let limiter = Arc::new(RateLimiter::new(
            settings.stt_calls_per_minute,
            Duration::from_secs(settings.rate_limit_backoff_secs),
        ));

        let strategy = FallbackStrategy::new(
            Arc::clone(&source),
            stt,
            limiter,
            settings.chunk_words_per_entry,
            settings.chunk_entry_duration_secs,
        );

        let runner = Arc::new(PipelineRunner {
            store: Arc::clone(&store),
            cache: Arc::clone(&cache),
            strategy,
            tracker,
            output_dir: PathBuf::from(&settings.output_dir),
        });

        let dispatcher = Dispatcher::new(settings.max_concurrent_jobs, Arc::clone(&store), runner);

        cache.spawn_sweeper(Duration::from_secs(settings.cache_sweep_interval_secs));
        store.spawn_retention_sweeper(
            Duration::from_secs(settings.job_retention_secs),
            Duration::from_secs(settings.cache_sweep_interval_secs),
        );

        Arc::new(Self {
            settings,
            store,
            cache,
            dispatcher,
            coordinator: BatchCoordinator::new(),
            source,
        })
    }

    /// Submits a single video reference; returns the job id.
    pub async fn submit(
        &self,
        reference: &str,
        mode: Mode,
        language: Option<&str>,
    ) -> Result<String, EngineError> {
        let video_id = self.source.resolve_id(reference).await.map_err(|e| {
            EngineError::SourceUnavailable(format!("could not resolve video reference: {e}"))
        })?;
        Ok(self.enqueue_job(reference, video_id, None, mode, language, None))
    }

    /// Submits an explicit list of references as one batch; returns the
    /// group id. Members that fail to resolve are recorded as failed jobs
    /// and the rest of the batch proceeds.
    pub async fn submit_batch(
        &self,
        references: &[String],
        mode: Mode,
        language: Option<&str>,
    ) -> Result<String, EngineError> {
        if references.is_empty() {
            return Err(EngineError::SourceUnavailable(
                "batch contains no video references".to_string(),
            ));
        }

        let group_id = nanoid!();
        self.coordinator.create_group(group_id.clone());
        info!(%group_id, members = references.len(), "batch submitted");

        for reference in references {
            match self.source.resolve_id(reference).await {
                Ok(video_id) => {
                    let job_id = self.enqueue_job(
                        reference,
                        video_id,
                        None,
                        mode,
                        language,
                        Some(group_id.clone()),
                    );
                    self.coordinator.add_member(&group_id, job_id);
                }
                Err(e) => {
                    // Continue-on-error: the member is recorded as failed,
                    // its siblings still run.
                    warn!(%group_id, %reference, error = %e, "batch member failed to resolve");
                    let job_id = self.record_failed_member(
                        reference,
                        mode,
                        language,
                        &group_id,
                        format!("could not resolve video reference: {e}"),
                    );
                    self.coordinator.add_member(&group_id, job_id);
                }
            }
        }

        Ok(group_id)
    }

    /// Expands a playlist reference and submits its members as one batch;
    /// returns the group id.
    pub async fn submit_playlist(
        &self,
        reference: &str,
        mode: Mode,
        language: Option<&str>,
    ) -> Result<String, EngineError> {
        let items = self.source.expand_playlist(reference).await.map_err(|e| {
            EngineError::SourceUnavailable(format!("could not expand playlist: {e}"))
        })?;
        if items.is_empty() {
            return Err(EngineError::SourceUnavailable(
                "playlist contains no videos".to_string(),
            ));
        }

        let group_id = nanoid!();
        self.coordinator.create_group(group_id.clone());
        info!(%group_id, %reference, members = items.len(), "playlist submitted");

        for item in items {
            let job_id = self.enqueue_job(
                reference,
                item.video_id,
                Some(item.title),
                mode,
                language,
                Some(group_id.clone()),
            );
            self.coordinator.add_member(&group_id, job_id);
        }

        Ok(group_id)
    }

    /// Returns the status of a job or a batch group.
    pub fn get_status(&self, id: &str) -> Result<Status, EngineError> {
        if let Some(job) = self.store.snapshot(id) {
            return Ok(Status::Job {
                state: job.state,
                percent: job.percent,
                error: job.error,
            });
        }
        if let Some(group) = self.coordinator.status(id, &self.store) {
            return Ok(Status::Group(group));
        }
        Err(EngineError::NotFound(format!("unknown job or group id '{id}'")))
    }

    /// Returns a completed job's transcript in the requested format, or
    /// `NotReady` while the job has not completed.
    pub fn get_result(
        &self,
        job_id: &str,
        format: TranscriptFormat,
    ) -> Result<JobResult, EngineError> {
        let job = self
            .store
            .snapshot(job_id)
            .ok_or_else(|| EngineError::NotFound(format!("unknown job id '{job_id}'")))?;

        match job.result {
            Some(bundle) if job.state == JobState::Complete => {
                Ok(JobResult::Ready(bundle.format(format).to_string()))
            }
            _ => Ok(JobResult::NotReady),
        }
    }

    /// The result cache; exposed so the embedding application can clear or
    /// invalidate entries.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn enqueue_job(
        &self,
        reference: &str,
        video_id: String,
        title: Option<String>,
        mode: Mode,
        language: Option<&str>,
        group_id: Option<String>,
    ) -> String {
        let job_id = nanoid!();
        let job = Job::new(
            job_id.clone(),
            video_id,
            reference.to_string(),
            title,
            mode,
            language.map(str::to_string),
            group_id,
        );
        info!(%job_id, video_id = %job.video_id, mode = %mode, "job submitted");
        self.store.insert(job);
        self.dispatcher.submit(job_id.clone());
        job_id
    }

    fn record_failed_member(
        &self,
        reference: &str,
        mode: Mode,
        language: Option<&str>,
        group_id: &str,
        error: String,
    ) -> String {
        let job_id = nanoid!();
        let job = Job::new(
            job_id.clone(),
            reference.to_string(),
            reference.to_string(),
            None,
            mode,
            language.map(str::to_string),
            Some(group_id.to_string()),
        );
        self.store.insert(job);
        self.store.fail(&job_id, error);
        job_id
    }
}

/// Runs one job end-to-end: cache consult, fallback strategy, rendering,
/// persistence, terminal transition, tracker notifications.
struct PipelineRunner {
    store: Arc<JobStore>,
    cache: Arc<ResultCache>,
    strategy: FallbackStrategy,
    tracker: Option<Arc<dyn PersistentTracker>>,
    output_dir: PathBuf,
}

#[async_trait]
impl JobRunner for PipelineRunner {
    async fn run(&self, job_id: String) {
        let Some(job) = self.store.snapshot(&job_id) else {
            warn!(%job_id, "claimed job no longer in store");
            return;
        };
        if job.state.is_terminal() {
            return;
        }

        if let Some(tracker) = &self.tracker {
            if let Err(e) = tracker.record_job_start(&job).await {
                warn!(%job_id, error = %e, "job-start tracker notification failed");
            }
        }

        match self.execute(&job).await {
            Ok(bundle) => {
                self.store.complete(&job_id, bundle);
                info!(%job_id, video_id = %job.video_id, "job complete");
            }
            Err(e) => {
                warn!(%job_id, video_id = %job.video_id, error = %e, "job failed");
                self.store.fail(&job_id, e.to_string());
            }
        }

        if let Some(tracker) = &self.tracker {
            if let Some(snap) = self.store.snapshot(&job_id) {
                if let Err(e) = tracker
                    .record_job_outcome(&job_id, snap.state, snap.error.as_deref())
                    .await
                {
                    warn!(%job_id, error = %e, "job-outcome tracker notification failed");
                }
            }
        }
    }
}

impl PipelineRunner {
    async fn execute(&self, job: &Job) -> Result<TranscriptBundle, EngineError> {
        let progress = JobProgress::new(&self.store, &job.id);
        progress.advance(JobState::Downloading);

        let key = CacheKey::new(&job.video_id, job.mode, job.language.as_deref());
        if let Some(bundle) = self.cache.get(&key) {
            info!(job_id = %job.id, video_id = %job.video_id, "serving cached transcript");
            // Walk the remaining states so observed sequences stay a
            // prefix of the canonical chain.
            progress.advance(JobState::ExtractingSource);
            progress.advance(JobState::Transcribing);
            progress.advance(JobState::SavingResults);
            return Ok(bundle);
        }

        let entries = self
            .strategy
            .resolve_transcript(&job.video_id, job.mode, job.language.as_deref(), &progress)
            .await?;

        progress.advance(JobState::SavingResults);
        let bundle = TranscriptBundle {
            text: render_text(&entries),
            srt: render_srt(&entries),
            vtt: render_vtt(&entries),
        };
        self.persist(job, &bundle).await?;
        self.cache.set(key, bundle.clone(), None);

        Ok(bundle)
    }

    /// Writes the three transcript files under `<output_dir>/<job_id>/`.
    async fn persist(&self, job: &Job, bundle: &TranscriptBundle) -> Result<(), EngineError> {
        let dir = self.output_dir.join(&job.id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| EngineError::SaveFailed(e.to_string()))?;

        for format in [TranscriptFormat::Text, TranscriptFormat::Srt, TranscriptFormat::Vtt] {
            let path = dir.join(format!("{}.{}", job.video_id, format.extension()));
            tokio::fs::write(&path, bundle.format(format))
                .await
                .map_err(|e| EngineError::SaveFailed(e.to_string()))?;
        }
        Ok(())
    }
}
