//! Shared key-value store capability
//!
//! A thin typed surface over the Redis-compatible store the cache tier
//! lives in. The engine only ever touches the store through this trait;
//! deployments back it with a real client, tests with [`InMemoryStore`].
//!
//! Raw values are opaque strings (the engine stores JSON documents and the
//! `__NULL__` sentinel). Atomicity requirements:
//!
//! - `set_if_absent` is the lock-acquisition primitive (SET NX PX)
//! - `compare_and_delete` is the token-checked lock release; a
//!   get-check-delete sequence is NOT an acceptable implementation (a
//!   server-side script provides it on a real store)

mod memory;

pub use memory::{InMemoryStore, StoreStats};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// `ttl_seconds` result for a key with no expiry
pub const TTL_NO_EXPIRY: i64 = -1;

/// `ttl_seconds` result for an absent key
pub const TTL_ABSENT: i64 = -2;

/// Typed operations against the shared store
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Get the raw value at `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set `key` with no expiry
    async fn set(&self, key: &str, raw: &str) -> Result<()>;

    /// Set `key` with a physical TTL
    async fn set_with_ttl(&self, key: &str, raw: &str, ttl: Duration) -> Result<()>;

    /// Atomically set `key` with a TTL only if it does not exist.
    /// Returns true if the write happened.
    async fn set_if_absent(&self, key: &str, raw: &str, ttl: Duration) -> Result<bool>;

    /// Delete `key`. Returns true if an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remaining TTL in whole seconds: [`TTL_NO_EXPIRY`] for a key without
    /// expiry, [`TTL_ABSENT`] for a missing key. Used by tests and
    /// diagnostics.
    async fn ttl_seconds(&self, key: &str) -> Result<i64>;

    /// Atomically delete `key` only if its value equals `expected`.
    /// Returns true if the entry was deleted.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool>;
}
