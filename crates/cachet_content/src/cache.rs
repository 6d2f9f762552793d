//! Cache validity evaluation.
//!
//! A consumer's cached content may be reused when it is non-empty and its
//! timestamp cell is younger than the consumer's [`CacheTtl`].

use core::time::Duration;

use cachet_cell::{Cell, CellRegistry};
use cachet_core_plugins::Clock;
use chrono::{DateTime, TimeDelta, Utc};

use crate::content::Content;

/// Value type of a cache timestamp cell.
pub type CacheTimestamp = Option<DateTime<Utc>>;

/// How long fetched content stays fresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheTtl {
    /// Non-empty content never expires.
    #[default]
    Forever,
    /// Content expires once it is older than the given age.
    Expires(TimeDelta),
}

impl CacheTtl {
    /// Builds a TTL from milliseconds. Zero or negative means [`Forever`](Self::Forever).
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        if millis <= 0 {
            Self::Forever
        } else {
            Self::Expires(TimeDelta::milliseconds(millis))
        }
    }

    /// Returns the TTL in milliseconds, `0` for [`Forever`](Self::Forever).
    #[must_use]
    pub fn as_millis(&self) -> i64 {
        match self {
            Self::Forever => 0,
            Self::Expires(ttl) => ttl.num_milliseconds(),
        }
    }

    /// Returns true if content of the given age is still fresh.
    #[must_use]
    pub fn admits(&self, age: TimeDelta) -> bool {
        match self {
            Self::Forever => true,
            Self::Expires(ttl) => age <= *ttl,
        }
    }
}

impl From<i64> for CacheTtl {
    fn from(millis: i64) -> Self {
        Self::from_millis(millis)
    }
}

impl From<i32> for CacheTtl {
    fn from(millis: i32) -> Self {
        Self::from_millis(i64::from(millis))
    }
}

impl From<Duration> for CacheTtl {
    fn from(ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::Forever;
        }
        Self::Expires(TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX))
    }
}

/// Returns the timestamp cell registered under `key`, creating it unset.
pub fn cache_timestamp(registry: &CellRegistry, key: &str) -> Cell<CacheTimestamp> {
    registry.get_or_create(key, None)
}

/// Decides whether `content` may be served without fetching.
///
/// 1. Empty content is never valid.
/// 2. [`CacheTtl::Forever`] accepts any non-empty content.
/// 3. Otherwise the content is valid while `now - timestamp <= ttl`. An unset
///    timestamp counts as the Unix epoch.
///
/// Never writes to a cell. The timestamp cell is created unset if nobody has
/// asked for it yet.
pub fn is_cache_valid<C: Content>(
    registry: &CellRegistry,
    content: &C,
    timestamp_key: &str,
    ttl: CacheTtl,
    clock: &Clock,
) -> bool {
    if content.is_empty() {
        return false;
    }
    is_cache_valid_with(content, &cache_timestamp(registry, timestamp_key), ttl, clock)
}

/// Same rules as [`is_cache_valid`], against a timestamp cell the caller
/// already holds.
pub fn is_cache_valid_with<C: Content>(
    content: &C,
    timestamp: &Cell<CacheTimestamp>,
    ttl: CacheTtl,
    clock: &Clock,
) -> bool {
    if content.is_empty() {
        return false;
    }
    if ttl == CacheTtl::Forever {
        return true;
    }

    let fetched_at = timestamp.get().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    ttl.admits(clock.elapsed_since(fetched_at))
}
