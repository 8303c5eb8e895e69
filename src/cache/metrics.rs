//! Cache metrics collection
//!
//! Relaxed atomic counters for observing strategy behavior: hit ratios,
//! how often readers were served stale data, and how often the engine
//! degraded around store faults.

use std::sync::atomic::{AtomicU64, Ordering};

/// Engine-wide counters
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    null_hits: AtomicU64,
    stale_serves: AtomicU64,
    source_loads: AtomicU64,
    lock_contentions: AtomicU64,
    refresh_dispatches: AtomicU64,
    corrupt_evictions: AtomicU64,
    store_degradations: AtomicU64,
}

impl CacheMetrics {
    /// Create a zeroed collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_null_hit(&self) {
        self.null_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_serve(&self) {
        self.stale_serves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_source_load(&self) {
        self.source_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lock_contention(&self) {
        self.lock_contentions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_dispatch(&self) {
        self.refresh_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corrupt_eviction(&self) {
        self.corrupt_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_degradation(&self) {
        self.store_degradations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of probes that hit, 0.0 when nothing was probed
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            null_hits: self.null_hits.load(Ordering::Relaxed),
            stale_serves: self.stale_serves.load(Ordering::Relaxed),
            source_loads: self.source_loads.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
            refresh_dispatches: self.refresh_dispatches.load(Ordering::Relaxed),
            corrupt_evictions: self.corrupt_evictions.load(Ordering::Relaxed),
            store_degradations: self.store_degradations.load(Ordering::Relaxed),
            hit_ratio: self.hit_ratio(),
        }
    }
}

/// Point-in-time metrics view
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Cache probes that returned a value
    pub hits: u64,
    /// Cache probes that found nothing
    pub misses: u64,
    /// Probes answered by the negative-cache sentinel
    pub null_hits: u64,
    /// Logical-expire reads served past their freshness deadline
    pub stale_serves: u64,
    /// Loads that reached the authoritative source
    pub source_loads: u64,
    /// Lock acquisitions that lost the race
    pub lock_contentions: u64,
    /// Background refreshes handed to the pool
    pub refresh_dispatches: u64,
    /// Entries evicted because they failed to deserialize
    pub corrupt_evictions: u64,
    /// Operations degraded around a store fault
    pub store_degradations: u64,
    /// hits / (hits + misses)
    pub hit_ratio: f64,
}

// =============================================================================
// Tests
// =============================================================================
