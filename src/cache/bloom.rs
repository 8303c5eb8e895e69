//! Bloom filter
//!
//! Fixed-size bitset with double hashing, built once from a snapshot of
//! known symbols and read by many threads. The bitset is frozen after
//! construction, so `might_contain` needs no synchronization.
//!
//! Membership of any inserted element returns true (no false negatives);
//! absent elements return true with probability ≤ the configured
//! false-positive rate at build time.

use sha2::{Digest, Sha256};

/// Lower clamp for the false-positive probability
const MIN_FPP: f64 = 1e-4;
/// Upper clamp for the false-positive probability
const MAX_FPP: f64 = 0.5;

/// Build-once-read-many bloom filter over symbols
#[derive(Debug, Clone)]
pub struct BloomFilter {
    /// Frozen bitset, 64 bits per word
    bits: Vec<u64>,
    /// Number of addressable bits
    bit_count: u64,
    /// Hash functions per element
    hash_count: u32,
}

impl BloomFilter {
    /// Create an empty filter sized for `expected_insertions` elements at
    /// false-positive probability `fpp` (clamped to [1e-4, 0.5])
    pub fn new(expected_insertions: usize, fpp: f64) -> Self {
        let n = expected_insertions.max(1) as f64;
        let p = fpp.clamp(MIN_FPP, MAX_FPP);

        let ln2 = std::f64::consts::LN_2;
        let bit_count = (-n * p.ln() / (ln2 * ln2)).ceil().max(1.0) as u64;
        let hash_count = ((bit_count as f64 / n * ln2).round() as u32).max(1);

        let words = bit_count.div_ceil(64) as usize;
        Self {
            bits: vec![0u64; words],
            bit_count,
            hash_count,
        }
    }

    /// Build a filter containing every symbol in `values`
    pub fn from_symbols<S: AsRef<str>>(values: &[S], fpp: f64) -> Self {
        let mut filter = Self::new(values.len(), fpp);
        for value in values {
            filter.put(value.as_ref());
        }
        filter
    }

    /// Insert a symbol. Only valid during construction; the filter is
    /// frozen once shared.
    pub fn put(&mut self, value: &str) {
        let (h1, h2) = Self::hash128(value);
        for i in 0..self.hash_count {
            let index = self.bit_index(h1, h2, i);
            self.bits[(index / 64) as usize] |= 1u64 << (index % 64);
        }
    }

    /// True if `value` might have been inserted; false means definitely not
    pub fn might_contain(&self, value: &str) -> bool {
        let (h1, h2) = Self::hash128(value);
        for i in 0..self.hash_count {
            let index = self.bit_index(h1, h2, i);
            if self.bits[(index / 64) as usize] & (1u64 << (index % 64)) == 0 {
                return false;
            }
        }
        true
    }

    /// Number of addressable bits
    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    /// Hash functions evaluated per element
    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    #[inline]
    fn bit_index(&self, h1: u64, h2: u64, i: u32) -> u64 {
        let combined = h1.wrapping_add((i as u64).wrapping_mul(h2));
        (combined & i64::MAX as u64) % self.bit_count
    }

    /// 128-bit digest split into two 64-bit halves
    fn hash128(value: &str) -> (u64, u64) {
        let digest = Sha256::digest(value.as_bytes());
        let h1 = u64::from_be_bytes(digest[0..8].try_into().unwrap());
        let h2 = u64::from_be_bytes(digest[8..16].try_into().unwrap());
        (h1, h2)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_false_negatives() {
        let symbols: Vec<String> = (0..1_000).map(|i| format!("VAL{i:05}")).collect();
        let filter = BloomFilter::from_symbols(&symbols, 0.01);

        for symbol in &symbols {
            assert!(filter.might_contain(symbol), "lost {symbol}");
        }
    }

    #[test]
    fn test_false_positive_rate_is_bounded() {
        let symbols: Vec<String> = (0..1_000).map(|i| format!("VAL{i:05}")).collect();
        let filter = BloomFilter::from_symbols(&symbols, 0.01);

        let probes = 10_000;
        let false_positives = (0..probes)
            .filter(|i| filter.might_contain(&format!("BAD{i:05}")))
            .count();

        // Loose bound: 3x the configured rate
        let rate = false_positives as f64 / probes as f64;
        assert!(rate <= 0.03, "false positive rate {rate} out of bounds");
    }

    #[test]
    fn test_deterministic_for_same_inputs() {
        let symbols = ["BTC", "ETH", "SOL"];
        let a = BloomFilter::from_symbols(&symbols, 0.01);
        let b = BloomFilter::from_symbols(&symbols, 0.01);
        assert_eq!(a.bits, b.bits);
        assert_eq!(a.hash_count(), b.hash_count());
    }

    #[test]
    fn test_parameter_clamps() {
        // Zero insertions and out-of-range fpp still produce a usable filter
        let tiny = BloomFilter::new(0, 1e-9);
        assert!(tiny.bit_count() >= 1);
        assert!(tiny.hash_count() >= 1);

        let loose = BloomFilter::new(10, 0.99);
        assert!(loose.bit_count() >= 1);
    }

    #[test]
    fn test_sizing_grows_with_precision() {
        let coarse = BloomFilter::new(10_000, 0.1);
        let fine = BloomFilter::new(10_000, 0.001);
        assert!(fine.bit_count() > coarse.bit_count());
        assert!(fine.hash_count() > coarse.hash_count());
    }

    #[test]
    fn test_empty_filter_contains_nothing() {
        let filter = BloomFilter::new(100, 0.01);
        assert!(!filter.might_contain("BTC"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// Every inserted element is reported present
            #[test]
            fn inserted_elements_are_found(
                symbols in prop::collection::hash_set("[A-Z]{1,12}", 1..200),
                fpp in 1e-4f64..0.5,
            ) {
                let symbols: Vec<String> = symbols.into_iter().collect();
                let filter = BloomFilter::from_symbols(&symbols, fpp);
                for symbol in &symbols {
                    prop_assert!(filter.might_contain(symbol));
                }
            }

            /// Same input set and parameters build identical filters
            #[test]
            fn construction_is_deterministic(
                symbols in prop::collection::vec("[A-Z0-9]{1,10}", 1..100),
            ) {
                let a = BloomFilter::from_symbols(&symbols, 0.01);
                let b = BloomFilter::from_symbols(&symbols, 0.01);
                prop_assert_eq!(a.bits, b.bits);
            }
        }
    }
}
