//! Shared test harness
//!
//! Wires an engine over the in-memory store and source, and drives
//! concurrent request bursts with a barrier so every task hits the cache
//! at the same instant.

// Each integration test binary uses a different slice of this harness
#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Barrier;
use tokio::task::JoinSet;

use quotecache::{
    CacheConfig, CacheEngine, InMemorySourceRepository, InMemoryStore, ManualClock, Quote,
};

pub struct TestContext {
    pub engine: CacheEngine<Quote>,
    pub store: Arc<InMemoryStore>,
    pub source: Arc<InMemorySourceRepository>,
    pub clock: Arc<ManualClock>,
}

/// Engine over a source with the realistic 50ms simulated latency
pub fn context(config: CacheConfig) -> TestContext {
    context_with_latency(config, InMemorySourceRepository::DEFAULT_LATENCY)
}

/// Engine over an instant source, for tests where latency is noise
pub fn fast_context(config: CacheConfig) -> TestContext {
    context_with_latency(config, Duration::ZERO)
}

fn context_with_latency(config: CacheConfig, latency: Duration) -> TestContext {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let source = Arc::new(InMemorySourceRepository::with_latency(latency));
    let clock = Arc::new(ManualClock::at_wall_clock());
    let engine = CacheEngine::new(store.clone(), source.clone(), config).with_clock(clock.clone());
    TestContext {
        engine,
        store,
        source,
        clock,
    }
}

/// A sample quote for seeding hot keys
pub fn sample_quote(symbol: &str) -> Quote {
    Quote::new(symbol, 100.00, 1.0, 1_000_000.0)
}

/// Run `tasks` futures that all start together behind a barrier, returning
/// every result
pub async fn run_concurrent<Fut>(tasks: usize, make: impl Fn(usize) -> Fut) -> Vec<Fut::Output>
where
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let barrier = Arc::new(Barrier::new(tasks));
    let mut join_set = JoinSet::new();
    for i in 0..tasks {
        let task = make(i);
        let barrier = barrier.clone();
        join_set.spawn(async move {
            barrier.wait().await;
            task.await
        });
    }

    let mut results = Vec::with_capacity(tasks);
    while let Some(result) = join_set.join_next().await {
        results.push(result.expect("concurrent task panicked"));
    }
    results
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
