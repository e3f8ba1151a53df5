//! Delta translator: raw order records → net per-level size deltas
//!
//! Each record is netted against the order's previous contribution kept in
//! the [`OrderLedger`]:
//! - unseen order, removal → ignored
//! - unseen order → `+size` at (side, price)
//! - known order, removal → `-prior size` at (prior side, prior price)
//! - known order, amendment → `-prior size` at the prior key, `+size` at the
//!   new key (covers size changes, price moves and side flips alike)
//!
//! Deltas for the same (side, price) accumulate across the batch; keys that
//! net to zero are dropped.

use std::collections::BTreeMap;

use tracing::trace;
use types::numeric::{is_negligible, Price};
use types::order::{BookSide, Side};

use crate::events::OrderEvent;
use crate::ledger::{OrderLedger, OrderRecord};
use crate::level::{AskOrder, BidOrder, Ranked, SideOrder};

/// Net size change at one price within one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelDelta {
    pub price: Price,
    /// Signed size change.
    pub size: f64,
    /// Timestamp of the last record touching this price.
    pub time: i64,
}

/// Net deltas of one batch, each side best-first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetDeltas {
    pub asks: Vec<LevelDelta>,
    pub bids: Vec<LevelDelta>,
    /// Removal records for orders the ledger never saw.
    pub ignored: usize,
}

impl NetDeltas {
    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

/// Per-side accumulator keyed by ranked price.
struct Accumulator<S: SideOrder> {
    deltas: BTreeMap<Ranked<S>, LevelDelta>,
}

impl<S: SideOrder> Accumulator<S> {
    fn new() -> Self {
        Self {
            deltas: BTreeMap::new(),
        }
    }

    fn add(&mut self, price: Price, size: f64, time: i64) {
        self.deltas
            .entry(Ranked::new(price))
            .and_modify(|delta| {
                delta.size += size;
                delta.time = time;
            })
            .or_insert(LevelDelta { price, size, time });
    }

    fn finish(self) -> Vec<LevelDelta> {
        self.deltas
            .into_values()
            .filter(|delta| !is_negligible(delta.size))
            .collect()
    }
}

/// Translates record batches into net level deltas.
pub struct DeltaTranslator {
    asks: Accumulator<AskOrder>,
    bids: Accumulator<BidOrder>,
    ignored: usize,
}

impl DeltaTranslator {
    fn new() -> Self {
        Self {
            asks: Accumulator::new(),
            bids: Accumulator::new(),
            ignored: 0,
        }
    }

    /// Translate one batch, updating the ledger along the way.
    ///
    /// The batch must not be empty.
    pub fn translate(ledger: &mut OrderLedger, records: &[OrderEvent]) -> NetDeltas {
        debug_assert!(!records.is_empty(), "order batch must not be empty");

        let mut translator = Self::new();
        for record in records {
            translator.apply(ledger, record);
        }
        translator.finish()
    }

    fn apply(&mut self, ledger: &mut OrderLedger, record: &OrderEvent) {
        trace!(
            index = record.index.value(),
            price = record.price,
            size = record.size,
            side = ?record.side,
            flags = record.flags.bits(),
            "Order record"
        );

        let removal = record.is_removal();
        let prior = ledger.prior(record.index).copied();

        match (prior, removal) {
            (None, true) => {
                self.ignored += 1;
            }
            (None, false) => {
                self.contribute(record.side, record.price(), record.size, record.time);
                ledger.upsert(OrderRecord::from(record));
            }
            (Some(prior), true) => {
                self.contribute(prior.side, prior.price, -prior.size, record.time);
                ledger.remove(record.index);
            }
            (Some(prior), false) => {
                self.contribute(prior.side, prior.price, -prior.size, record.time);
                self.contribute(record.side, record.price(), record.size, record.time);
                ledger.upsert(OrderRecord::from(record));
            }
        }
    }

    fn contribute(&mut self, side: Side, price: Option<Price>, size: f64, time: i64) {
        // Orders without a price are tracked but never form a level.
        let Some(price) = price else {
            return;
        };

        match side.book_side() {
            BookSide::Bid => self.bids.add(price, size, time),
            BookSide::Ask => self.asks.add(price, size, time),
        }
    }

    fn finish(self) -> NetDeltas {
        NetDeltas {
            asks: self.asks.finish(),
            bids: self.bids.finish(),
            ignored: self.ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::OrderIndex;

    fn prices(deltas: &[LevelDelta]) -> Vec<(f64, f64)> {
        deltas.iter().map(|d| (d.price.value(), d.size)).collect()
    }

    #[test]
    fn test_new_orders_are_additions() {
        let mut ledger = OrderLedger::new();
        let deltas = DeltaTranslator::translate(
            &mut ledger,
            &[
                OrderEvent::new(1, Side::SELL, 10.0, 5.0, 1),
                OrderEvent::new(2, Side::SELL, 11.0, 3.0, 2),
                OrderEvent::new(3, Side::BUY, 9.0, 2.0, 3),
            ],
        );

        assert_eq!(prices(&deltas.asks), vec![(10.0, 5.0), (11.0, 3.0)]);
        assert_eq!(prices(&deltas.bids), vec![(9.0, 2.0)]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_same_price_orders_accumulate() {
        let mut ledger = OrderLedger::new();
        let deltas = DeltaTranslator::translate(
            &mut ledger,
            &[
                OrderEvent::new(1, Side::BUY, 10.0, 5.0, 1),
                OrderEvent::new(2, Side::BUY, 10.0, 3.0, 7),
            ],
        );

        assert_eq!(prices(&deltas.bids), vec![(10.0, 8.0)]);
        assert_eq!(deltas.bids[0].time, 7);
    }

    #[test]
    fn test_unseen_removal_is_ignored() {
        let mut ledger = OrderLedger::new();
        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::removal(42, 1)]);

        assert!(deltas.is_empty());
        assert_eq!(deltas.ignored, 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_removal_nets_prior_contribution() {
        let mut ledger = OrderLedger::new();
        DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::SELL, 10.0, 5.0, 1)]);

        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::SELL, 10.0, 0.0, 2)]);

        assert_eq!(prices(&deltas.asks), vec![(10.0, -5.0)]);
        assert!(ledger.prior(OrderIndex::new(1)).is_none());
    }

    #[test]
    fn test_size_amendment_nets_to_difference() {
        let mut ledger = OrderLedger::new();
        DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::BUY, 10.0, 5.0, 1)]);

        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::BUY, 10.0, 7.0, 2)]);

        assert_eq!(prices(&deltas.bids), vec![(10.0, 2.0)]);
        assert_eq!(ledger.prior(OrderIndex::new(1)).unwrap().size, 7.0);
    }

    #[test]
    fn test_price_move_removes_old_key_and_adds_new() {
        let mut ledger = OrderLedger::new();
        DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::SELL, 10.0, 5.0, 1)]);

        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::SELL, 12.0, 5.0, 2)]);

        assert_eq!(prices(&deltas.asks), vec![(10.0, -5.0), (12.0, 5.0)]);
    }

    #[test]
    fn test_side_flip_at_same_price() {
        let mut ledger = OrderLedger::new();
        DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::BUY, 10.0, 4.0, 1)]);

        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::SELL, 10.0, 4.0, 2)]);

        assert_eq!(prices(&deltas.bids), vec![(10.0, -4.0)]);
        assert_eq!(prices(&deltas.asks), vec![(10.0, 4.0)]);
    }

    #[test]
    fn test_price_move_nets_with_removal_at_old_price() {
        let mut ledger = OrderLedger::new();
        DeltaTranslator::translate(
            &mut ledger,
            &[
                OrderEvent::new(1, Side::BUY, 10.0, 4.0, 1),
                OrderEvent::new(2, Side::BUY, 10.0, 6.0, 1),
            ],
        );

        // Order 1 moves away from 10 while order 2 at 10 is cancelled.
        let deltas = DeltaTranslator::translate(
            &mut ledger,
            &[
                OrderEvent::new(1, Side::BUY, 9.0, 4.0, 2),
                OrderEvent::removal(2, 3),
            ],
        );

        assert_eq!(prices(&deltas.bids), vec![(10.0, -10.0), (9.0, 4.0)]);
        assert_eq!(deltas.bids[0].time, 3);
    }

    #[test]
    fn test_net_zero_key_is_dropped() {
        let mut ledger = OrderLedger::new();
        let deltas = DeltaTranslator::translate(
            &mut ledger,
            &[
                OrderEvent::new(1, Side::SELL, 10.0, 5.0, 1),
                OrderEvent::removal(1, 2),
            ],
        );

        assert!(deltas.is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_absent_price_contributes_nothing() {
        let mut ledger = OrderLedger::new();
        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::SELL, f64::NAN, 5.0, 1)]);
        assert!(deltas.is_empty());
        assert_eq!(ledger.len(), 1);

        // Once it gets a price it shows up with its full size.
        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::SELL, 10.0, 5.0, 2)]);
        assert_eq!(prices(&deltas.asks), vec![(10.0, 5.0)]);
    }

    #[test]
    fn test_undefined_side_books_as_ask() {
        let mut ledger = OrderLedger::new();
        let deltas = DeltaTranslator::translate(&mut ledger, &[OrderEvent::new(1, Side::UNDEFINED, 10.0, 1.0, 1)]);
        assert_eq!(deltas.asks.len(), 1);
        assert!(deltas.bids.is_empty());
    }
}
