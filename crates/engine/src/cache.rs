use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::job::Mode;
use crate::TranscriptBundle;

/// Cache key: one transcript per (video, mode, language) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub video_id: String,
    pub mode: Mode,
    pub language: String,
}

impl CacheKey {
    pub fn new(video_id: &str, mode: Mode, language: Option<&str>) -> Self {
        Self {
            video_id: video_id.to_string(),
            mode,
            language: language.unwrap_or("auto").to_string(),
        }
    }
}

struct CacheSlot {
    bundle: TranscriptBundle,
    expires_at: Instant,
}

/// TTL-bounded result cache.
///
/// Expiry is hybrid: a read past the expiry instant reports a miss and
/// removes the entry, and a periodic sweep clears entries nobody reads.
/// The cache is an optimization only; clearing it at any point must not
/// change behavior beyond recomputation cost.
pub struct ResultCache {
    entries: DashMap<CacheKey, CacheSlot>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<TranscriptBundle> {
        let expired = match self.entries.get(key) {
            Some(slot) if slot.expires_at > Instant::now() => return Some(slot.bundle.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
            debug!(video_id = %key.video_id, "evicted expired cache entry on read");
        }
        None
    }

    pub fn set(&self, key: CacheKey, bundle: TranscriptBundle, ttl: Option<Duration>) {
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        self.entries.insert(key, CacheSlot { bundle, expires_at });
    }

    pub fn delete(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries past their expiry instant.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|slot| slot.expires_at <= now)
            .map(|slot| slot.key().clone())
            .collect();
        for key in &expired {
            self.entries.remove(key);
        }
        expired.len()
    }

    /// Spawns the periodic expiry sweep.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = cache.sweep_expired();
                if removed > 0 {
                    debug!(removed, "cache sweep removed expired entries");
                }
            }
        });
    }
}
