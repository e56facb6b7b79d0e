//! Single-entry cache manager for the normalized dataset
//!
//! Provides a `CacheManager` that keeps the most recent dataset with the time
//! it was stored, and reports whether it is still within its TTL.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::clock::{Clock, SystemClock};
use crate::data::Dataset;

/// Default time-to-live for the cached dataset, in seconds
pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// The cached dataset and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached data
    pub data: Arc<Dataset>,
    /// When the data was cached
    pub cached_at: DateTime<Utc>,
}

/// Diagnostic view of the cache for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// Whether an entry is held at all
    pub cached: bool,
    /// Whole seconds since the entry was stored
    pub age_seconds: i64,
    /// Whole seconds of freshness left; negative once stale
    pub remaining_seconds: i64,
    /// Whether the entry is still fresh
    pub is_valid: bool,
}

impl CacheStatus {
    fn empty() -> Self {
        Self {
            cached: false,
            age_seconds: 0,
            remaining_seconds: 0,
            is_valid: false,
        }
    }
}

/// Holds at most one dataset
///
/// There is no eviction: an entry is replaced by [`put`](Self::put) or
/// removed by [`clear`](Self::clear), never dropped for age alone. Staleness
/// only changes how the fetcher routes a request.
pub struct CacheManager {
    entry: Option<CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("entry", &self.entry)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheManager {
    /// Creates an empty cache with the default TTL and the system clock
    pub fn new() -> Self {
        Self::with_clock(Duration::seconds(DEFAULT_TTL_SECS), Arc::new(SystemClock))
    }

    /// Creates an empty cache with a custom TTL and clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: None,
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored entry whether or not it is fresh
    pub fn get(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    /// Replaces the stored entry, stamped with the current time
    pub fn put(&mut self, data: Arc<Dataset>) {
        self.entry = Some(CacheEntry {
            data,
            cached_at: self.clock.now(),
        });
    }

    /// Whether an entry exists and is younger than the TTL
    pub fn is_fresh(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| self.clock.now() - entry.cached_at < self.ttl)
    }

    /// Removes the stored entry
    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// Reports age and remaining freshness of the stored entry
    pub fn status(&self) -> CacheStatus {
        let Some(entry) = &self.entry else {
            return CacheStatus::empty();
        };

        let age = self.clock.now() - entry.cached_at;
        let remaining = self.ttl - age;

        CacheStatus {
            cached: true,
            age_seconds: age.num_milliseconds().div_euclid(1000),
            remaining_seconds: remaining.num_milliseconds().div_euclid(1000),
            is_valid: remaining > Duration::zero(),
        }
    }
}
