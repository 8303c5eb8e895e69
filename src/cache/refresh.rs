//! Background refresh pool
//!
//! Bounded worker pool for stale-while-revalidate refreshes. Parallelism
//! is capped by a semaphore; a submission that finds no free slot is
//! dropped, not queued. A lost refresh is safe because the next stale
//! read dispatches again.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Bounded executor for refresh tasks
pub struct RefreshExecutor {
    permits: Arc<Semaphore>,
    capacity: usize,
    dropped: AtomicU64,
}

impl RefreshExecutor {
    /// Create a pool running at most `capacity` tasks concurrently
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Spawn `task` if a slot is free. Returns false when the pool is full
    /// or shut down, in which case the task is dropped.
    pub fn try_submit<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                tokio::spawn(async move {
                    task.await;
                    drop(permit);
                });
                true
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Wait for outstanding tasks to finish, then refuse further work
    pub async fn shutdown(&self) {
        if let Ok(all) = self.permits.acquire_many(self.capacity as u32).await {
            all.forget();
        }
        self.permits.close();
    }

    /// Free slots right now
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Tasks dropped because the pool was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================
