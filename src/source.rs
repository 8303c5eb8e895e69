//! Authoritative data source
//!
//! The cache sits in front of a database or remote API reached through
//! [`SourceRepository`]. The bundled [`InMemorySourceRepository`] simulates
//! that source for tests and experiments: seeded quotes, configurable
//! latency, and an atomic query counter for measuring load amplification.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::quote::Quote;

/// Authoritative source of cached records
#[async_trait]
pub trait SourceRepository<V>: Send + Sync {
    /// Load a record from the source. May block on IO; failures propagate
    /// to the reader untouched.
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<V>>;

    /// Fast admission check against the set of known symbols. Must not
    /// perform source IO.
    fn exists_symbol(&self, symbol: &str) -> bool;
}

/// In-memory source for tests and strategy experiments
///
/// Serves [`Quote`] records with a simulated per-query latency and counts
/// every `find_by_symbol` call so tests can assert how many loads reached
/// the source.
pub struct InMemorySourceRepository {
    /// Known-symbol whitelist
    valid_symbols: RwLock<HashSet<String>>,
    /// Simulated source data
    data: RwLock<HashMap<String, Quote>>,
    /// Total find_by_symbol calls
    query_count: AtomicU64,
    /// Simulated per-query latency
    latency: Duration,
    /// When true, every find_by_symbol fails
    fail_lookups: AtomicBool,
}

impl InMemorySourceRepository {
    /// Default simulated source latency
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(50);

    /// Create a repository seeded with the default market data
    pub fn new() -> Self {
        Self::with_latency(Self::DEFAULT_LATENCY)
    }

    /// Create a repository with a custom simulated latency
    pub fn with_latency(latency: Duration) -> Self {
        let repo = Self {
            valid_symbols: RwLock::new(HashSet::new()),
            data: RwLock::new(HashMap::new()),
            query_count: AtomicU64::new(0),
            latency,
            fail_lookups: AtomicBool::new(false),
        };
        repo.seed_defaults();
        repo
    }

    fn seed_defaults(&self) {
        self.update_quote("BTC", Quote::new("BTC", 67_500.00, 2.5, 28_000_000_000.0));
        self.update_quote("ETH", Quote::new("ETH", 3_650.00, 1.8, 15_000_000_000.0));
        self.update_quote("XRP", Quote::new("XRP", 0.52, -0.5, 1_200_000_000.0));
        self.update_quote("SOL", Quote::new("SOL", 145.00, 5.2, 3_500_000_000.0));
        self.update_quote("DOGE", Quote::new("DOGE", 0.12, 0.3, 800_000_000.0));
        self.update_quote("ADA", Quote::new("ADA", 0.45, -1.2, 450_000_000.0));
        self.update_quote("AVAX", Quote::new("AVAX", 35.50, 3.1, 620_000_000.0));
        self.update_quote("DOT", Quote::new("DOT", 7.20, 0.8, 320_000_000.0));
    }

    /// Total number of source loads performed
    pub fn query_count(&self) -> u64 {
        self.query_count.load(Ordering::Relaxed)
    }

    /// Reset the load counter
    pub fn reset_query_count(&self) {
        self.query_count.store(0, Ordering::Relaxed);
    }

    /// Insert or replace a quote and whitelist its symbol
    pub fn update_quote(&self, symbol: impl Into<String>, quote: Quote) {
        let symbol = symbol.into();
        self.data.write().insert(symbol.clone(), quote);
        self.valid_symbols.write().insert(symbol);
    }

    /// Whitelist a symbol without backing data (penetration experiments)
    pub fn add_valid_symbol_only(&self, symbol: impl Into<String>) {
        self.valid_symbols.write().insert(symbol.into());
    }

    /// Remove a quote, leaving the symbol whitelisted
    pub fn remove_quote(&self, symbol: &str) {
        self.data.write().remove(symbol);
    }

    /// Seed `count` quotes named `<prefix><00000..>` and return the symbols
    pub fn seed_quotes(&self, count: usize, prefix: &str) -> Vec<String> {
        let mut symbols = Vec::with_capacity(count);
        for i in 0..count {
            let symbol = format!("{prefix}{i:05}");
            self.update_quote(&symbol, Quote::new(&symbol, 100.00, 1.0, 1_000_000.0));
            symbols.push(symbol);
        }
        symbols
    }

    /// Make every subsequent lookup fail (SourceFailure experiments)
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Drop all data and reseed the defaults
    pub fn reset_data(&self) {
        self.data.write().clear();
        self.valid_symbols.write().clear();
        self.seed_defaults();
    }
}

impl Default for InMemorySourceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceRepository<Quote> for InMemorySourceRepository {
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Quote>> {
        let count = self.query_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(symbol, total_queries = count, "source load");

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::source(symbol, "injected source failure"));
        }

        let quote = self.data.read().get(symbol).map(|q| Quote {
            updated_at: Utc::now(),
            ..q.clone()
        });
        Ok(quote)
    }

    fn exists_symbol(&self, symbol: &str) -> bool {
        self.valid_symbols.read().contains(symbol)
    }
}

// =============================================================================
// Tests
// =============================================================================
