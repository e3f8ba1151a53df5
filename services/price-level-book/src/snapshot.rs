//! Checksummed snapshots of the visible book
//!
//! A consumer that keeps its own view from change notifications can compare
//! its checksum against a snapshot of the book to detect divergence.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::ids::{SourceId, Symbol};

use crate::level::PriceLevel;

/// The visible book at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub source: SourceId,
    /// Number of cycles processed when the snapshot was taken.
    pub version: u64,
    /// Asks in ascending price order (best first).
    pub asks: Vec<PriceLevel>,
    /// Bids in descending price order (best first).
    pub bids: Vec<PriceLevel>,
    /// SHA-256 checksum of the level content.
    pub checksum: String,
}

impl BookSnapshot {
    pub fn new(symbol: Symbol, source: SourceId, version: u64, asks: Vec<PriceLevel>, bids: Vec<PriceLevel>) -> Self {
        let checksum = compute_checksum(&asks, &bids);
        Self {
            symbol,
            source,
            version,
            asks,
            bids,
            checksum,
        }
    }

    /// Verify the stored checksum against the level content.
    pub fn verify(&self) -> bool {
        compute_checksum(&self.asks, &self.bids) == self.checksum
    }
}

/// Compute a deterministic SHA-256 checksum over both sides.
///
/// Covers price and size of each level in best-first order; timestamps are
/// left out so a consumer only needs prices and sizes to match.
pub fn compute_checksum(asks: &[PriceLevel], bids: &[PriceLevel]) -> String {
    let mut hasher = Sha256::new();

    hasher.update(b"A");
    for level in asks {
        hasher.update(level.price.value().to_le_bytes());
        hasher.update(level.size.to_le_bytes());
    }
    hasher.update(b"B");
    for level in bids {
        hasher.update(level.price.value().to_le_bytes());
        hasher.update(level.size.to_le_bytes());
    }

    format!("{:x}", hasher.finalize())
}
