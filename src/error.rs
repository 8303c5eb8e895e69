//! Error types for the quote cache

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the caching layer
///
/// Only [`Error::Source`] ever reaches a reader: store faults degrade to
/// cache misses, lock contention resolves through a direct source read, and
/// corrupt entries are evicted and treated as misses.
#[derive(Error, Debug)]
pub enum Error {
    /// The shared store rejected or timed out an operation
    #[error("store unavailable: {0}")]
    Store(String),

    /// The authoritative source failed during a load
    #[error("source lookup failed for symbol '{symbol}': {reason}")]
    Source { symbol: String, reason: String },

    /// A stored raw value deserialized as neither a value nor the null sentinel
    #[error("corrupt cache entry at key '{key}'")]
    Corrupt { key: String },

    /// A caller-supplied value could not be serialized for the store
    #[error("serialization error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a source failure for the given symbol
    pub fn source(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Source {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// True if this error is a store fault that reads must absorb
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
