//! Cache configuration
//!
//! Immutable bundle of tunables carried by the engine. All durations are
//! plain integers in the unit their name states, mirroring how they are
//! expressed in deployment config.

use std::time::Duration;

/// Tunables for the caching strategy engine
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Base physical TTL for positive entries (seconds)
    pub base_ttl_seconds: u64,
    /// Inclusive upper bound of the TTL jitter offset (seconds)
    pub ttl_jitter_seconds: u64,
    /// Distributed lock lease; the lock-wait backoff derives from this (milliseconds)
    pub lock_timeout_ms: u64,
    /// TTL for negative (null sentinel) entries (seconds)
    pub null_cache_ttl_seconds: u64,
    /// Time until a logical-expire envelope becomes stale (seconds)
    pub logical_expire_seconds: u64,
    /// Extra physical TTL on logical-expire entries beyond the stale point (seconds)
    pub stale_ttl_buffer_seconds: u64,
    /// Background refresh pool size
    pub refresh_threads: usize,
    /// In-process single-flight join timeout (milliseconds)
    pub single_flight_wait_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_ttl_seconds: 60,
            ttl_jitter_seconds: 10,
            lock_timeout_ms: 100,
            null_cache_ttl_seconds: 30,
            logical_expire_seconds: 60,
            stale_ttl_buffer_seconds: 30,
            refresh_threads: 4,
            single_flight_wait_ms: 500,
        }
    }
}

impl CacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base physical TTL in seconds
    pub fn with_base_ttl(mut self, seconds: u64) -> Self {
        self.base_ttl_seconds = seconds;
        self
    }

    /// Set the inclusive jitter range in seconds
    pub fn with_ttl_jitter(mut self, seconds: u64) -> Self {
        self.ttl_jitter_seconds = seconds;
        self
    }

    /// Set the lock lease in milliseconds (floored at 2ms so the backoff is nonzero)
    pub fn with_lock_timeout_ms(mut self, millis: u64) -> Self {
        self.lock_timeout_ms = millis.max(2);
        self
    }

    /// Set the negative-cache TTL in seconds
    pub fn with_null_cache_ttl(mut self, seconds: u64) -> Self {
        self.null_cache_ttl_seconds = seconds;
        self
    }

    /// Set the logical expiry window in seconds
    pub fn with_logical_expire(mut self, seconds: u64) -> Self {
        self.logical_expire_seconds = seconds;
        self
    }

    /// Set the stale buffer added to the physical TTL of logical entries
    pub fn with_stale_ttl_buffer(mut self, seconds: u64) -> Self {
        self.stale_ttl_buffer_seconds = seconds;
        self
    }

    /// Set the refresh pool size (floored at 1)
    pub fn with_refresh_threads(mut self, threads: usize) -> Self {
        self.refresh_threads = threads.max(1);
        self
    }

    /// Set the single-flight join timeout in milliseconds
    pub fn with_single_flight_wait_ms(mut self, millis: u64) -> Self {
        self.single_flight_wait_ms = millis;
        self
    }

    /// Lock lease duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Backoff slept by callers that lost the lock race
    pub fn lock_backoff(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms / 2)
    }

    /// Join timeout for single-flight followers
    pub fn single_flight_wait(&self) -> Duration {
        Duration::from_millis(self.single_flight_wait_ms)
    }

    /// TTL for negative entries
    pub fn null_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.null_cache_ttl_seconds)
    }

    /// Physical TTL for logical-expire entries: the stale window plus the
    /// buffer during which a stale-but-present envelope stays observable
    pub fn logical_physical_ttl(&self) -> Duration {
        Duration::from_secs(self.logical_expire_seconds + self.stale_ttl_buffer_seconds)
    }
}

// =============================================================================
// Tests
// =============================================================================
