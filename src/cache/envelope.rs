//! Logical-expiry wrapper
//!
//! Stale-while-revalidate entries carry their freshness deadline inside the
//! stored value, distinct from the store's physical TTL. The envelope stays
//! physically present for the stale window so readers can serve it while a
//! background refresh runs.

use serde::{Deserialize, Serialize};

/// Cache envelope for logical-expire entries
///
/// A `None` value records a negative entry: the source had no record at
/// refresh time. Equality is by field; no interior mutability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEnvelope<V> {
    /// Cached value, or None for a negative entry
    pub value: Option<V>,
    /// Freshness deadline, epoch milliseconds
    pub logical_expire_at_ms: i64,
}

impl<V> CacheEnvelope<V> {
    /// Wrap a value with a freshness deadline
    pub fn new(value: Option<V>, logical_expire_at_ms: i64) -> Self {
        Self {
            value,
            logical_expire_at_ms,
        }
    }

    /// True once the supplied clock reading has passed the deadline
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.logical_expire_at_ms
    }
}

// =============================================================================
// Tests
// =============================================================================
