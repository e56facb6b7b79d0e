//! Cache module holding the last good dataset in memory
//!
//! This module provides a single-entry read-through cache with a fixed TTL.
//! Stale entries are kept and returned with their age, allowing the fetcher
//! to serve old data when the sheet endpoint is unavailable. Time comes from
//! an injected [`Clock`] so freshness can be tested deterministically.

mod clock;
mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheEntry, CacheManager, CacheStatus, DEFAULT_TTL_SECS};
