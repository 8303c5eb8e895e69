//! Symbol admission
//!
//! Every read is gated by an admission predicate before the cache or the
//! source is touched; rejected symbols are a miss with zero IO. This is the
//! penetration defense for keys that will never exist.

use std::sync::Arc;

use super::bloom::BloomFilter;
use crate::source::SourceRepository;

/// Admission policy applied ahead of every read
#[derive(Clone)]
pub enum SymbolAdmission {
    /// Admit every symbol
    Always,
    /// Admit symbols the source whitelists via `exists_symbol`
    Whitelist,
    /// Admit symbols that might be in a frozen bloom snapshot.
    ///
    /// A filter built before a symbol was added to the source rejects it
    /// until a rebuilt filter is installed; the engine never rebuilds on
    /// its own.
    Bloom(Arc<BloomFilter>),
}

impl SymbolAdmission {
    /// Evaluate the predicate for `symbol`
    pub fn admits<V>(&self, source: &dyn SourceRepository<V>, symbol: &str) -> bool {
        match self {
            Self::Always => true,
            Self::Whitelist => source.exists_symbol(symbol),
            Self::Bloom(filter) => filter.might_contain(symbol),
        }
    }
}

impl std::fmt::Debug for SymbolAdmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::Whitelist => write!(f, "Whitelist"),
            Self::Bloom(filter) => f
                .debug_struct("Bloom")
                .field("bits", &filter.bit_count())
                .field("hashes", &filter.hash_count())
                .finish(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySourceRepository;
    use std::time::Duration;

    fn repo() -> InMemorySourceRepository {
        InMemorySourceRepository::with_latency(Duration::ZERO)
    }

    #[test]
    fn test_always_admits() {
        let repo = repo();
        assert!(SymbolAdmission::Always.admits(&repo, "ANYTHING"));
    }

    #[test]
    fn test_whitelist_follows_source() {
        let repo = repo();
        let admission = SymbolAdmission::Whitelist;
        assert!(admission.admits(&repo, "BTC"));
        assert!(!admission.admits(&repo, "BAD0001"));
    }

    #[test]
    fn test_bloom_blocks_unknown() {
        let repo = repo();
        let filter = Arc::new(BloomFilter::from_symbols(&["BTC", "ETH"], 0.01));
        let admission = SymbolAdmission::Bloom(filter);
        assert!(admission.admits(&repo, "BTC"));
        assert!(!admission.admits(&repo, "SOMETHING_ELSE"));
    }
}
