//! Order side types

use serde::{Deserialize, Serialize};

/// Order side as reported by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
    /// Side not reported
    #[default]
    UNDEFINED,
}

impl Side {
    /// Book side this order rests on
    ///
    /// Only buy orders rest on the bid side; sell and undefined orders are
    /// booked as asks.
    pub fn book_side(&self) -> BookSide {
        match self {
            Side::BUY => BookSide::Bid,
            Side::SELL | Side::UNDEFINED => BookSide::Ask,
        }
    }
}

/// One side of an aggregated book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSide::Bid => "bid",
            BookSide::Ask => "ask",
        }
    }
}
