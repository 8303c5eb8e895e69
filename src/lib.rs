//! quotecache - Read-Through Quote Cache
//!
//! A caching facade between request handlers and an authoritative data
//! source, using a shared Redis-compatible store as the cache tier. The
//! engine is built to survive the three pathological traffic patterns:
//!
//! - **Stampede**: concurrent misses for one hot key converge on the
//!   source. Countered by a cross-process distributed lock, in-process
//!   single flight, and logical expiry with stale-while-revalidate.
//! - **Avalanche**: a population of keys expires at once. Countered by
//!   randomized or keyed TTL jitter.
//! - **Penetration**: lookups for keys that will never exist. Countered
//!   by negative caching and whitelist/bloom admission.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quotecache::{CacheConfig, CacheEngine, InMemorySourceRepository, InMemoryStore};
//!
//! # async fn run() -> quotecache::Result<()> {
//! let store = Arc::new(InMemoryStore::new());
//! let source = Arc::new(InMemorySourceRepository::new());
//! let engine = CacheEngine::new(store, source, CacheConfig::default());
//!
//! if let Some(quote) = engine.get("BTC").await? {
//!     println!("BTC = {}", quote.price);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`cache`] - The strategy engine and its collaborators
//! - [`clock`] - Time capability for testable logical expiry
//! - [`config`] - Engine tunables
//! - [`error`] - Error types
//! - [`quote`] - Domain record and cacheability marker
//! - [`source`] - Authoritative source contract + in-memory source
//! - [`store`] - Shared store contract + in-memory store

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod quote;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use cache::{
    keys, BloomFilter, CacheEngine, CacheEnvelope, CacheMetrics, DistributedLock, LockLease,
    MetricsSnapshot, RefreshExecutor, SingleFlight, SymbolAdmission, NULL_MARKER,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use quote::{CacheRecord, Quote};
pub use source::{InMemorySourceRepository, SourceRepository};
pub use store::{InMemoryStore, StoreClient, StoreStats, TTL_ABSENT, TTL_NO_EXPIRY};
