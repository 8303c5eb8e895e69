//! Caching strategy engine
//!
//! Read-through caching against a shared key-value store, engineered for
//! the three pathological traffic patterns:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         CacheEngine                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Stampede            │ Avalanche          │ Penetration          │
//! │  ┌────────────────┐  │ ┌───────────────┐  │ ┌─────────────────┐  │
//! │  │ DistributedLock│  │ │ TTL jitter    │  │ │ Null sentinel   │  │
//! │  │ SingleFlight   │  │ │ (random/hash) │  │ │ SymbolAdmission │  │
//! │  │ Logical expire │  │ │               │  │ │ BloomFilter     │  │
//! │  └────────────────┘  │ └───────────────┘  │ └─────────────────┘  │
//! │          │                    │                     │            │
//! │          └────────────────────┴─────────────────────┘            │
//! │                               │                                  │
//! │            StoreClient  ·  SourceRepository  ·  Clock            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key layout
//!
//! - `quotes:<symbol>`: serialized value or the `__NULL__` sentinel
//! - `quotes:logical:<symbol>`: serialized [`CacheEnvelope`]
//! - `lock:quotes:<symbol>`: random lock token
//! - `lock:quotes:logical:<symbol>`: random refresh-lock token

mod admission;
mod bloom;
mod engine;
mod envelope;
mod lock;
mod metrics;
mod refresh;
mod single_flight;

pub use admission::SymbolAdmission;
pub use bloom::BloomFilter;
pub use engine::CacheEngine;
pub use envelope::CacheEnvelope;
pub use lock::{DistributedLock, LockLease};
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use refresh::RefreshExecutor;
pub use single_flight::SingleFlight;

/// Negative-cache marker; reserved, never a legal serialized value
pub const NULL_MARKER: &str = "__NULL__";

/// Store key construction
pub mod keys {
    /// Prefix for plain cache entries
    pub const CACHE_PREFIX: &str = "quotes:";
    /// Prefix for logical-expire entries
    pub const LOGICAL_PREFIX: &str = "quotes:logical:";
    /// Prefix for plain-entry locks
    pub const LOCK_PREFIX: &str = "lock:quotes:";
    /// Prefix for logical-refresh locks
    pub const LOGICAL_LOCK_PREFIX: &str = "lock:quotes:logical:";

    /// `quotes:<symbol>`
    pub fn cache(symbol: &str) -> String {
        format!("{CACHE_PREFIX}{symbol}")
    }

    /// `quotes:logical:<symbol>`
    pub fn logical(symbol: &str) -> String {
        format!("{LOGICAL_PREFIX}{symbol}")
    }

    /// `lock:quotes:<symbol>`
    pub fn lock(symbol: &str) -> String {
        format!("{LOCK_PREFIX}{symbol}")
    }

    /// `lock:quotes:logical:<symbol>`
    pub fn logical_lock(symbol: &str) -> String {
        format!("{LOGICAL_LOCK_PREFIX}{symbol}")
    }
}

// =============================================================================
// Tests
// =============================================================================
