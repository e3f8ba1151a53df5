//! Bounded level store for one book side
//!
//! Holds every non-empty level of the side in best-first order, plus a cursor
//! on the last level visible to consumers. With a depth cap of N only the N
//! best levels are visible; the rest are retained so they can be promoted
//! when a visible level disappears. A cap of 0 means unbounded.
//!
//! The cursor is the ranked price of the Nth best level (or of the last level
//! while the side holds fewer than N). Neighbours of the cursor are found with
//! ordered-map range queries, so each change costs O(log n) instead of a
//! recount of the window.
//!
//! Net deltas are classified against the stored levels and then applied in
//! three phases: removals, additions, updates. Removals free capacity that
//! additions may reclaim; updates never move a level.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use tracing::warn;
use types::numeric::{is_negligible, Price};

use crate::changes::SideChanges;
use crate::delta::LevelDelta;
use crate::level::{PriceLevel, Ranked, SideOrder};

#[derive(Debug)]
pub struct LevelStore<S: SideOrder> {
    levels: BTreeMap<Ranked<S>, PriceLevel>,
    /// Last visible level; None when the side is empty or the depth is
    /// unbounded.
    last_visible: Option<Ranked<S>>,
    depth: usize,
}

impl<S: SideOrder> LevelStore<S> {
    pub fn new(depth: usize) -> Self {
        Self {
            levels: BTreeMap::new(),
            last_visible: None,
            depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of stored levels, visible or not.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&Ranked::new(price))
    }

    /// Price of the last visible level, None when unbounded or empty.
    pub fn last_visible_price(&self) -> Option<Price> {
        self.last_visible.map(|key| key.price())
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.last_visible = None;
    }

    /// Visible levels, best first.
    pub fn visible(&self) -> Vec<PriceLevel> {
        if self.depth == 0 {
            return self.levels.values().copied().collect();
        }
        match self.last_visible {
            Some(last) => self.levels.range(..=last).map(|(_, level)| *level).collect(),
            None => Vec::new(),
        }
    }

    /// Apply one batch of net deltas and return the visible changes.
    pub fn apply(&mut self, deltas: &[LevelDelta]) -> SideChanges<S> {
        let mut additions = Vec::new();
        let mut updates = Vec::new();
        let mut removals = Vec::new();

        for delta in deltas {
            match self.levels.get(&Ranked::new(delta.price)) {
                None if delta.size > 0.0 => {
                    additions.push(PriceLevel::new(delta.price, delta.size, delta.time));
                }
                None => {
                    warn!(
                        side = S::SIDE.as_str(),
                        price = delta.price.value(),
                        size = delta.size,
                        "Negative delta for unknown level, skipping"
                    );
                }
                Some(existing) => {
                    let size = existing.size + delta.size;
                    if is_negligible(size) || size < 0.0 {
                        if size < 0.0 {
                            warn!(
                                side = S::SIDE.as_str(),
                                price = delta.price.value(),
                                size,
                                "Level size went negative, removing level"
                            );
                        }
                        removals.push(*existing);
                    } else {
                        updates.push(PriceLevel::new(delta.price, size, delta.time));
                    }
                }
            }
        }

        let mut changes = SideChanges::new();
        for level in &removals {
            self.remove_level(level, &mut changes);
        }
        for level in &additions {
            self.add_level(*level, &mut changes);
        }
        for level in &updates {
            self.update_level(*level, &mut changes);
        }

        debug_assert_eq!(self.last_visible, self.expected_cursor());
        changes
    }

    fn remove_level(&mut self, level: &PriceLevel, changes: &mut SideChanges<S>) {
        if self.levels.is_empty() {
            return;
        }
        let key = Ranked::new(level.price);

        if self.depth == 0 {
            if let Some(removed) = self.levels.remove(&key) {
                changes.record_removal(removed);
            }
            self.last_visible = None;
            return;
        }

        let Some(last) = self.last_visible else {
            return;
        };
        let overflowing = self.levels.len() > self.depth;
        let visible = !overflowing || key <= last;

        let Some(removed) = self.levels.remove(&key) else {
            return;
        };
        if !visible {
            return;
        }
        changes.record_removal(removed);

        if overflowing {
            // The first hidden level moves into the window.
            let promoted = self
                .levels
                .range((Excluded(last), Unbounded))
                .next()
                .map(|(key, level)| (*key, *level));
            if let Some((promoted_key, promoted)) = promoted {
                changes.record_addition(promoted);
                self.last_visible = Some(promoted_key);
            }
        } else if key == last {
            self.last_visible = self.levels.range(..last).next_back().map(|(key, _)| *key);
        }
    }

    fn add_level(&mut self, level: PriceLevel, changes: &mut SideChanges<S>) {
        let key = Ranked::new(level.price);

        if self.depth == 0 {
            self.levels.insert(key, level);
            changes.record_addition(level);
            self.last_visible = None;
            return;
        }

        let full = self.levels.len() >= self.depth;
        let visible = !full || self.last_visible.map_or(true, |last| key < last);

        self.levels.insert(key, level);
        if !visible {
            return;
        }
        changes.record_addition(level);

        match self.last_visible {
            Some(last) if full => {
                // The old boundary level is pushed out of the window.
                if let Some(evicted) = self.levels.get(&last).copied() {
                    changes.record_removal(evicted);
                }
                self.last_visible = self.levels.range(..last).next_back().map(|(key, _)| *key);
            }
            Some(last) if key < last => {}
            _ => self.last_visible = Some(key),
        }
    }

    fn update_level(&mut self, level: PriceLevel, changes: &mut SideChanges<S>) {
        let key = Ranked::new(level.price);

        if self.depth == 0 {
            self.levels.insert(key, level);
            changes.record_update(level);
            self.last_visible = None;
            return;
        }

        let Some(stored) = self.levels.get_mut(&key) else {
            return;
        };
        *stored = level;

        if self.last_visible.is_some_and(|last| key <= last) {
            changes.record_update(level);
        }
    }

    /// Cursor position recomputed from scratch.
    fn expected_cursor(&self) -> Option<Ranked<S>> {
        if self.depth == 0 || self.levels.is_empty() {
            return None;
        }
        let visible = self.levels.len().min(self.depth);
        self.levels.keys().nth(visible - 1).copied()
    }
}
