//! In-memory TTL cache for provider responses
//!
//! Entries expire a fixed duration after insertion. Reads check expiry
//! lazily, writes sweep every stale entry, and changing the duration applies
//! to existing entries immediately. Reads never refresh an entry's age.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::DEFAULT_CACHE_TTL;
use crate::error::{Error, Result};

/// Shortest duration accepted by [`TtlCache::set_duration`]
pub const MIN_CACHE_DURATION: Duration = Duration::from_secs(60);

/// A cached value together with its insertion instant
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    cached_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.cached_at) >= ttl
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V> CacheState<V> {
    /// Removes every expired entry, returning how many were dropped
    fn sweep(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - self.entries.len()
    }
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently stored, fresh or not
    pub total_entries: usize,
    /// Entries younger than the TTL
    pub active_entries: usize,
    /// Entries past the TTL that have not been evicted yet
    pub expired_entries: usize,
    /// Current TTL in minutes
    pub cache_duration_minutes: f64,
}

/// Key-value store with per-entry expiry
///
/// Safe to share between tasks; all state sits behind one mutex that is
/// never held across an await point.
#[derive(Debug)]
pub struct TtlCache<V> {
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache with the default 30 minute TTL
    pub fn new() -> Self {
        Self::with_duration(DEFAULT_CACHE_TTL)
    }

    /// Creates an empty cache with a custom TTL
    ///
    /// Unlike [`set_duration`](Self::set_duration) this does not enforce the
    /// one minute floor, so callers constructing from validated config can
    /// pass any value.
    pub fn with_duration(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                ttl,
            }),
        }
    }

    /// Returns the stored value if it is younger than the TTL
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let ttl = state.ttl;

        let expired = state.entries.get(key)?.is_expired(now, ttl);
        if expired {
            debug!("Cache expired for key: {}", key);
            state.entries.remove(key);
            return None;
        }

        debug!("Cache hit for key: {}", key);
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Stores a value, overwriting any previous entry, then sweeps stale entries
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut state = self.state.lock();
        let now = Instant::now();

        debug!("Caching data for key: {}", key);
        state.entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: now,
            },
        );

        let removed = state.sweep(now);
        if removed > 0 {
            debug!("Cleaned up {} expired cache entries", removed);
        }
    }

    /// Removes a single entry, returning whether it existed
    pub fn remove(&self, key: &str) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.state.lock().entries.clear();
        info!("Weather cache cleared");
    }

    /// Current time-to-live
    pub fn ttl(&self) -> Duration {
        self.state.lock().ttl
    }

    /// Changes the TTL for all entries, old and new, and sweeps immediately
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if `duration` is shorter than one minute.
    pub fn set_duration(&self, duration: Duration) -> Result<()> {
        if duration < MIN_CACHE_DURATION {
            return Err(Error::InvalidArgument(
                "Cache duration must be at least 1 minute".to_string(),
            ));
        }

        let mut state = self.state.lock();
        state.ttl = duration;
        info!(
            "Cache duration updated to {} minutes",
            duration.as_secs_f64() / 60.0
        );

        let removed = state.sweep(Instant::now());
        if removed > 0 {
            debug!("Cleaned up {} expired cache entries", removed);
        }
        Ok(())
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts fresh and stale entries without evicting anything
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let now = Instant::now();
        let total_entries = state.entries.len();
        let expired_entries = state
            .entries
            .values()
            .filter(|entry| entry.is_expired(now, state.ttl))
            .count();

        CacheStats {
            total_entries,
            active_entries: total_entries - expired_entries,
            expired_entries,
            cache_duration_minutes: state.ttl.as_secs_f64() / 60.0,
        }
    }
}
