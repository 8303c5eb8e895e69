//! Domain record and cacheability marker
//!
//! The engine is generic over the record it caches; [`Quote`] is the
//! concrete record the bundled in-memory source serves.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Marker trait for values the engine can cache.
///
/// Values travel through the shared store as JSON documents, so they must
/// round-trip through serde; `Clone` lets coalesced readers share one load
/// result; `Send + Sync + 'static` is required by background refreshes.
pub trait CacheRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheRecord for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A market quote for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol, e.g. "BTC"
    pub symbol: String,
    /// Last traded price
    pub price: f64,
    /// 24h change, percent
    pub change_24h: f64,
    /// 24h traded volume
    pub volume_24h: f64,
    /// When the source last updated this quote
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote updated now
    pub fn new(symbol: impl Into<String>, price: f64, change_24h: f64, volume_24h: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change_24h,
            volume_24h,
            updated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
