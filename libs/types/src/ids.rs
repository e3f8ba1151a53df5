//! Identifier types for book entities
//!
//! Order indices come straight from the feed and are only unique within one
//! symbol/source pair. Symbols and sources are opaque, non-empty strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feed-assigned identifier of a single order
///
/// Stable for the lifetime of the order; later events for the same order
/// carry the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderIndex(i64);

impl OrderIndex {
    pub fn new(index: i64) -> Self {
        Self(index)
    }

    /// Get the raw index value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for OrderIndex {
    fn from(index: i64) -> Self {
        Self(index)
    }
}

impl fmt::Display for OrderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instrument symbol (e.g., "AAPL", "BTC/USD")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol
    ///
    /// # Panics
    /// Panics if the symbol is empty or blank
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(!s.trim().is_empty(), "Symbol must not be empty");
        Self(s)
    }

    /// Try to create a Symbol, returning None if blank
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Order source identifier (exchange or venue code, e.g., "NTV")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Create a new SourceId
    ///
    /// # Panics
    /// Panics if the source is empty or blank
    pub fn new(source: impl Into<String>) -> Self {
        let s = source.into();
        assert!(!s.trim().is_empty(), "SourceId must not be empty");
        Self(s)
    }

    /// Try to create a SourceId, returning None if blank
    pub fn try_new(source: impl Into<String>) -> Option<Self> {
        let s = source.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
