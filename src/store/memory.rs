//! In-memory store
//!
//! DashMap-backed stand-in for the shared store. Per-key atomicity comes
//! from DashMap's shard locks: `entry` gives the atomic insert-if-absent
//! behind `set_if_absent`, and `remove_if` gives the atomic
//! compare-and-delete. Physical expiry is lazy: expired entries are
//! reaped by whichever operation touches them next.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{StoreClient, TTL_ABSENT, TTL_NO_EXPIRY};
use crate::error::Result;

#[derive(Debug, Clone)]
struct StoredValue {
    raw: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(raw: &str, ttl: Option<Duration>) -> Self {
        Self {
            raw: raw.to_string(),
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if Instant::now() >= at)
    }
}

/// Operation counters for diagnostics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Live entries (expired-but-unreaped excluded)
    pub entries: u64,
    /// Read operations
    pub reads: u64,
    /// Write operations
    pub writes: u64,
    /// Delete operations (including compare-and-delete)
    pub deletes: u64,
}

/// In-memory implementation of [`StoreClient`] for tests
pub struct InMemoryStore {
    entries: DashMap<String, StoredValue>,
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Operation counters and live entry count
    pub fn stats(&self) -> StoreStats {
        let live = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired())
            .count() as u64;
        StoreStats {
            entries: live,
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    /// Reap and return the live value at `key`
    fn live_value(&self, key: &str) -> Option<StoredValue> {
        let value = self.entries.get(key).map(|entry| entry.value().clone())?;
        if value.is_expired() {
            self.entries.remove_if(key, |_, v| v.is_expired());
            return None;
        }
        Some(value)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.live_value(key).map(|v| v.raw))
    }

    async fn set(&self, key: &str, raw: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.entries
            .insert(key.to_string(), StoredValue::new(raw, None));
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, raw: &str, ttl: Duration) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.entries
            .insert(key.to_string(), StoredValue::new(raw, Some(ttl)));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, raw: &str, ttl: Duration) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::Relaxed);

        // The entry handle holds the shard lock, making check-then-insert atomic
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoredValue::new(raw, Some(ttl)));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(raw, Some(ttl)));
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .entries
            .remove(key)
            .map(|(_, v)| !v.is_expired())
            .unwrap_or(false))
    }

    async fn ttl_seconds(&self, key: &str) -> Result<i64> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        match self.live_value(key) {
            None => Ok(TTL_ABSENT),
            Some(StoredValue {
                expires_at: None, ..
            }) => Ok(TTL_NO_EXPIRY),
            Some(StoredValue {
                expires_at: Some(at),
                ..
            }) => Ok(at.saturating_duration_since(Instant::now()).as_secs() as i64),
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        // remove_if holds the shard lock across the comparison
        Ok(self
            .entries
            .remove_if(key, |_, v| !v.is_expired() && v.raw == expected)
            .is_some())
    }
}

// =============================================================================
// Tests
// =============================================================================
