//! Distributed lock
//!
//! Token-based lease over the shared store: acquisition is a single
//! `set_if_absent` with a TTL, release is an atomic compare-and-delete so
//! a holder can never delete a lock that has expired and been re-acquired
//! by someone else. The TTL bounds the wedge time left by a crashed
//! holder; there is no renewal.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::store::StoreClient;

/// A held lease on a lock key
#[derive(Debug, Clone)]
pub struct LockLease {
    /// Lock key in the store
    pub key: String,
    /// Fresh 128-bit random token identifying this acquisition
    pub token: String,
    /// When the store will expire the lease on its own
    pub expires_at: Instant,
}

/// Advisory mutual exclusion across processes via lock keys
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn StoreClient>,
}

impl DistributedLock {
    /// Create a lock manager over the shared store
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// Try to acquire `key` for `ttl`. Returns the lease on success, None
    /// when another holder owns the key or the store is unreachable (the
    /// caller degrades the same way for both).
    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> Option<LockLease> {
        let token = Uuid::new_v4().to_string();
        match self.store.set_if_absent(key, &token, ttl).await {
            Ok(true) => Some(LockLease {
                key: key.to_string(),
                token,
                expires_at: Instant::now() + ttl,
            }),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "lock acquisition degraded by store fault");
                None
            }
        }
    }

    /// Release a lease. Compare-and-delete only: the key is deleted solely
    /// if it still holds this lease's token. Idempotent; store faults are
    /// logged and swallowed (the TTL reclaims the key).
    pub async fn release(&self, lease: &LockLease) {
        match self
            .store
            .compare_and_delete(&lease.key, &lease.token)
            .await
        {
            Ok(true) => tracing::debug!(key = %lease.key, "lock released"),
            Ok(false) => {
                tracing::debug!(key = %lease.key, "lock already expired or taken over")
            }
            Err(e) => {
                tracing::warn!(key = %lease.key, error = %e, "lock release degraded by store fault")
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
