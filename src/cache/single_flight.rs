//! In-process request coalescing
//!
//! Concurrent cache misses for the same key inside one process collapse to
//! a single source load. The first caller becomes the leader and runs the
//! loader; followers await the leader's outcome on a broadcast channel,
//! bounded by the configured join timeout.
//!
//! The in-flight map holds at most one entry per key, and the leader
//! removes the entry before publishing its outcome, so a late joiner
//! either observes the published result or starts a fresh flight, never
//! a completed-but-still-registered one.
//!
//! A follower that times out, or whose leader failed, falls back to
//! invoking the loader directly. That trades perfect deduplication for
//! bounded tail latency when a loader wedges.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::error::Result;

/// Deduplicates concurrent identical lookups within one process
pub struct SingleFlight<T> {
    in_flight: DashMap<String, broadcast::Sender<T>>,
    leads: AtomicU64,
    joins: AtomicU64,
    fallbacks: AtomicU64,
}

impl<T: Clone + Send + 'static> SingleFlight<T> {
    /// Create an empty flight group
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
            leads: AtomicU64::new(0),
            joins: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Run `loader` for `key`, coalescing with any flight already in
    /// progress. Followers wait at most `wait` before falling back to a
    /// direct `loader` call.
    pub async fn run<L, Fut>(&self, key: &str, wait: Duration, loader: L) -> Result<T>
    where
        L: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Atomic insert-if-absent: the entry handle holds the shard lock
        let existing = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(occupied) => Some(occupied.get().subscribe()),
            Entry::Vacant(vacant) => {
                let (tx, _) = broadcast::channel(1);
                vacant.insert(tx);
                None
            }
        };

        if let Some(mut rx) = existing {
            match tokio::time::timeout(wait, rx.recv()).await {
                Ok(Ok(value)) => {
                    self.joins.fetch_add(1, Ordering::Relaxed);
                    return Ok(value);
                }
                // Timeout, leader failure (channel closed), or lag:
                // bypass the flight and load directly
                _ => {
                    self.fallbacks.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key, "single-flight join failed, loading directly");
                    return loader().await;
                }
            }
        }

        self.leads.fetch_add(1, Ordering::Relaxed);

        // The guard clears the registration even if the loader panics or
        // the leading caller is cancelled mid-load; a leaked entry would
        // make every later caller for this key wait out the join timeout
        let mut flight = FlightGuard {
            map: &self.in_flight,
            key,
            done: false,
        };
        let result = loader().await;

        // Remove before publishing so no follower can observe a completed
        // flight that is still registered
        let sender = flight.finish();
        if let (Some(tx), Ok(value)) = (sender, &result) {
            let _ = tx.send(value.clone());
        }
        result
    }

    /// Flights currently in progress
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Calls that led a flight
    pub fn leads(&self) -> u64 {
        self.leads.load(Ordering::Relaxed)
    }

    /// Calls that joined an existing flight
    pub fn joins(&self) -> u64 {
        self.joins.load(Ordering::Relaxed)
    }

    /// Calls that fell back to a direct load
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }
}

impl<T: Clone + Send + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unregisters a led flight on every exit path
struct FlightGuard<'a, T> {
    map: &'a DashMap<String, broadcast::Sender<T>>,
    key: &'a str,
    done: bool,
}

impl<T> FlightGuard<'_, T> {
    /// Remove the registration and hand back the sender for publishing
    fn finish(&mut self) -> Option<broadcast::Sender<T>> {
        self.done = true;
        self.map.remove(self.key).map(|(_, tx)| tx)
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if !self.done {
            self.map.remove(self.key);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
