//! Raw order records delivered by the upstream feed
//!
//! A feed delivers batches of order records that share one symbol/source
//! pair. Each record is the latest known state of one order: a new order, an
//! amendment (price, size or even side may change) or a removal.
//!
//! Prices and sizes are kept exactly as the feed sends them (`f64`, possibly
//! NaN); interpretation happens in the delta translator.

use serde::{Deserialize, Serialize};
use types::ids::{OrderIndex, SourceId, Symbol};
use types::numeric::{is_negligible, Price};
use types::order::Side;

/// Bit flags attached to each order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFlags(u32);

impl EventFlags {
    pub const TX_PENDING: u32 = 0x01;
    /// The order was cancelled or filled and must leave the book.
    pub const REMOVE_EVENT: u32 = 0x02;
    pub const SNAPSHOT_BEGIN: u32 = 0x04;
    pub const SNAPSHOT_END: u32 = 0x08;
    pub const SNAPSHOT_SNIP: u32 = 0x10;

    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn removal() -> Self {
        Self(Self::REMOVE_EVENT)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn is_remove(&self) -> bool {
        self.contains(Self::REMOVE_EVENT)
    }
}

/// Kind of records carried by a batch. The book only understands orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Order,
    SpreadOrder,
    Other(String),
}

/// A single raw order record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderEvent {
    pub index: OrderIndex,
    /// Raw feed price; NaN means the order has no price.
    pub price: f64,
    /// Raw feed size; zero or NaN means the order is gone.
    pub size: f64,
    pub side: Side,
    /// Feed timestamp in milliseconds.
    pub time: i64,
    pub flags: EventFlags,
}

impl OrderEvent {
    /// Convenience constructor for a live order record.
    pub fn new(index: impl Into<OrderIndex>, side: Side, price: f64, size: f64, time: i64) -> Self {
        Self {
            index: index.into(),
            price,
            size,
            side,
            time,
            flags: EventFlags::empty(),
        }
    }

    /// Convenience constructor for an explicit removal record.
    pub fn removal(index: impl Into<OrderIndex>, time: i64) -> Self {
        Self {
            index: index.into(),
            price: f64::NAN,
            size: f64::NAN,
            side: Side::UNDEFINED,
            time,
            flags: EventFlags::removal(),
        }
    }

    pub fn with_flags(mut self, flags: EventFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether this record takes the order off the book: the remove flag is
    /// set, or the size is zero or NaN.
    pub fn is_removal(&self) -> bool {
        self.flags.is_remove() || self.size.is_nan() || is_negligible(self.size)
    }

    /// The record's price, absent when the feed sent NaN.
    pub fn price(&self) -> Option<Price> {
        Price::new(self.price)
    }
}

/// A batch of raw order records sharing one symbol/source pair.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBatch {
    pub symbol: Symbol,
    pub source: SourceId,
    pub kind: RecordKind,
    pub records: Vec<OrderEvent>,
}

impl OrderBatch {
    pub fn new(symbol: Symbol, source: SourceId, records: Vec<OrderEvent>) -> Self {
        Self {
            symbol,
            source,
            kind: RecordKind::Order,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
