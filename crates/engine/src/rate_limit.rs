use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter protecting the speech-to-text backend.
///
/// Admission is a blocking-wait policy, not a queue: a denied caller sleeps
/// for a fixed backoff and retries, so under sustained load workers stall
/// on admission and the pool degrades to lower effective concurrency
/// instead of failing jobs. Denial never surfaces as a job error.
pub struct RateLimiter {
    max_calls: usize,
    backoff: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls_per_minute: usize, backoff: Duration) -> Self {
        Self {
            // A zero-capacity window would make acquire() spin forever.
            max_calls: max_calls_per_minute.max(1),
            backoff,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Attempts admission: purges timestamps older than 60 s and admits if
    /// the window still has room, recording the call.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut window = self.window.lock();
        while window
            .front()
            .is_some_and(|t| now.duration_since(*t) >= WINDOW)
        {
            window.pop_front();
        }
        if window.len() < self.max_calls {
            window.push_back(now);
            true
        } else {
            false
        }
    }

    /// Blocks until admitted, sleeping the configured backoff between
    /// attempts.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            debug!(backoff_secs = self.backoff.as_secs_f64(), "rate window full, backing off");
            tokio::time::sleep(self.backoff).await;
        }
    }

    /// Calls currently inside the sliding window.
    pub fn in_flight(&self) -> usize {
        let now = Instant::now();
        let mut window = self.window.lock();
        while window
            .front()
            .is_some_and(|t| now.duration_since(*t) >= WINDOW)
        {
            window.pop_front();
        }
        window.len()
    }
}
