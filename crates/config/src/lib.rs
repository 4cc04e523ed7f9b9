use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Engine settings, loadable from the environment with coded defaults.
///
/// Every field can be overridden with a `VIDSCRIBE__`-prefixed variable,
/// e.g. `VIDSCRIBE__MAX_CONCURRENT_JOBS=8`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Upper bound on jobs executing at the same time.
    pub max_concurrent_jobs: usize,
    /// Sliding-window cap on speech-to-text backend calls per minute.
    pub stt_calls_per_minute: usize,
    /// Sleep between rate-limiter admission attempts, in seconds.
    pub rate_limit_backoff_secs: u64,
    /// Result cache time-to-live, in seconds.
    pub cache_ttl_secs: u64,
    /// Interval between cache expiry sweeps, in seconds.
    pub cache_sweep_interval_secs: u64,
    /// How long finished jobs stay queryable before the store drops them.
    pub job_retention_secs: u64,
    /// Words per synthesized caption entry when the speech-to-text backend
    /// returns plain text without timing.
    pub chunk_words_per_entry: usize,
    /// Duration assigned to each synthesized caption entry, in seconds.
    pub chunk_entry_duration_secs: f64,
    /// Directory transcript files are written under, one subdirectory per job.
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            stt_calls_per_minute: 30,
            rate_limit_backoff_secs: 5,
            cache_ttl_secs: 86_400,
            cache_sweep_interval_secs: 60,
            job_retention_secs: 3_600,
            chunk_words_per_entry: 10,
            chunk_entry_duration_secs: 5.0,
            output_dir: "tmp".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from the environment on top of the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(Environment::with_prefix("VIDSCRIBE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
