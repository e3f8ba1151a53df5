//! Change notifications produced by a processing cycle
//!
//! [`LevelChanges`] is a pair of best-first level lists (one per side) and is
//! used both for a whole visible book and for one kind of change.
//! [`ChangeSet`] groups the additions, updates and removals of one cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::level::{PriceLevel, Ranked, SideOrder};

/// Ask and bid levels, each best-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelChanges {
    /// Asks in ascending price order.
    pub asks: Vec<PriceLevel>,
    /// Bids in descending price order.
    pub bids: Vec<PriceLevel>,
}

impl LevelChanges {
    pub fn new(asks: Vec<PriceLevel>, bids: Vec<PriceLevel>) -> Self {
        Self { asks, bids }
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.asks.len() + self.bids.len()
    }
}

/// Level changes of one incremental cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub additions: LevelChanges,
    pub updates: LevelChanges,
    pub removals: LevelChanges,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.updates.is_empty() && self.removals.is_empty()
    }
}

/// Changes of one side within one cycle.
///
/// A price is held in at most one of the three maps: withdrawing an addition
/// made earlier in the same cycle replaces reporting a removal, and updating
/// such a level refreshes its addition entry.
#[derive(Debug)]
pub struct SideChanges<S: SideOrder> {
    additions: BTreeMap<Ranked<S>, PriceLevel>,
    updates: BTreeMap<Ranked<S>, PriceLevel>,
    removals: BTreeMap<Ranked<S>, PriceLevel>,
}

impl<S: SideOrder> Default for SideChanges<S> {
    fn default() -> Self {
        Self {
            additions: BTreeMap::new(),
            updates: BTreeMap::new(),
            removals: BTreeMap::new(),
        }
    }
}

impl<S: SideOrder> SideChanges<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A level became visible.
    pub fn record_addition(&mut self, level: PriceLevel) {
        self.additions.insert(Ranked::new(level.price), level);
    }

    /// A level left the visible window.
    pub fn record_removal(&mut self, level: PriceLevel) {
        let key = Ranked::new(level.price);
        if self.additions.remove(&key).is_none() {
            self.updates.remove(&key);
            self.removals.insert(key, level);
        }
    }

    /// A visible level changed size or time.
    pub fn record_update(&mut self, level: PriceLevel) {
        let key = Ranked::new(level.price);
        match self.additions.get_mut(&key) {
            Some(added) => *added = level,
            None => {
                self.updates.insert(key, level);
            }
        }
    }

    pub fn additions(&self) -> Vec<PriceLevel> {
        self.additions.values().copied().collect()
    }

    pub fn updates(&self) -> Vec<PriceLevel> {
        self.updates.values().copied().collect()
    }

    pub fn removals(&self) -> Vec<PriceLevel> {
        self.removals.values().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.updates.is_empty() && self.removals.is_empty()
    }
}

/// Assemble a cycle's change-set from both sides.
pub fn combine<A: SideOrder, B: SideOrder>(asks: &SideChanges<A>, bids: &SideChanges<B>) -> ChangeSet {
    ChangeSet {
        additions: LevelChanges::new(asks.additions(), bids.additions()),
        updates: LevelChanges::new(asks.updates(), bids.updates()),
        removals: LevelChanges::new(asks.removals(), bids.removals()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{AskOrder, BidOrder};
    use types::numeric::Price;

    fn level(price: f64, size: f64) -> PriceLevel {
        PriceLevel::new(Price::new(price).unwrap(), size, 1)
    }

    #[test]
    fn test_removal_of_cycle_addition_withdraws_it() {
        let mut changes = SideChanges::<AskOrder>::new();
        changes.record_addition(level(11.0, 3.0));
        changes.record_removal(level(11.0, 3.0));

        assert!(changes.is_empty());
    }

    #[test]
    fn test_update_of_cycle_addition_refreshes_it() {
        let mut changes = SideChanges::<AskOrder>::new();
        changes.record_addition(level(10.0, 5.0));
        changes.record_update(level(10.0, 7.0));

        assert_eq!(changes.additions(), vec![level(10.0, 7.0)]);
        assert!(changes.updates().is_empty());
    }

    #[test]
    fn test_lists_come_out_best_first() {
        let mut bids = SideChanges::<BidOrder>::new();
        bids.record_addition(level(9.0, 1.0));
        bids.record_addition(level(11.0, 1.0));
        bids.record_addition(level(10.0, 1.0));

        let asks = SideChanges::<AskOrder>::new();
        let set = combine(&asks, &bids);
        let prices: Vec<f64> = set.additions.bids.iter().map(|l| l.price.value()).collect();
        assert_eq!(prices, vec![11.0, 10.0, 9.0]);
        assert!(set.additions.asks.is_empty());
        assert_eq!(set.additions.len(), 3);
    }

    #[test]
    fn test_change_set_serialization() {
        let mut asks = SideChanges::<AskOrder>::new();
        asks.record_removal(level(10.0, 5.0));
        let set = combine(&asks, &SideChanges::<BidOrder>::new());

        let json = serde_json::to_string(&set).unwrap();
        let back: ChangeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
        assert!(!back.is_empty());
    }
}
