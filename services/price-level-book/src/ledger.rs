//! Per-order ledger
//!
//! Remembers the last contribution of every live order so that a later
//! amendment or removal can be netted against it.

use std::collections::HashMap;

use types::ids::OrderIndex;
use types::numeric::Price;
use types::order::Side;

use crate::events::OrderEvent;

/// Last known state of one order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRecord {
    pub index: OrderIndex,
    /// None when the feed never sent a usable price for this order.
    pub price: Option<Price>,
    pub size: f64,
    pub side: Side,
    pub time: i64,
}

impl From<&OrderEvent> for OrderRecord {
    fn from(event: &OrderEvent) -> Self {
        Self {
            index: event.index,
            price: event.price(),
            size: event.size,
            side: event.side,
            time: event.time,
        }
    }
}

/// Map from order index to the order's last known state.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: HashMap<OrderIndex, OrderRecord>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prior state of an order, if it has been seen and not removed.
    pub fn prior(&self, index: OrderIndex) -> Option<&OrderRecord> {
        self.orders.get(&index)
    }

    /// Insert or replace an order's state, returning the previous state.
    pub fn upsert(&mut self, record: OrderRecord) -> Option<OrderRecord> {
        self.orders.insert(record.index, record)
    }

    pub fn remove(&mut self, index: OrderIndex) -> Option<OrderRecord> {
        self.orders.remove(&index)
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
