//! Consumer-side mirror of the visible book
//!
//! Rebuilds the visible book from `on_new_book` notifications and incremental
//! change-sets alone. Strict: a change that does not fit the current view is
//! an error, which makes the mirror a checker for change-set consistency.

use std::collections::BTreeMap;

use tracing::debug;
use types::numeric::Price;

use crate::changes::{ChangeSet, LevelChanges};
use crate::level::{AskOrder, BidOrder, PriceLevel, Ranked, SideOrder};
use crate::snapshot::{compute_checksum, BookSnapshot};

/// Errors raised when a change does not fit the mirrored view.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MirrorError {
    #[error("{side} level {price} added twice")]
    DuplicateLevel { side: &'static str, price: Price },

    #[error("{side} level {price} is not in the view")]
    UnknownLevel { side: &'static str, price: Price },
}

/// A consumer's copy of the visible book.
#[derive(Debug, Default)]
pub struct BookMirror {
    asks: BTreeMap<Ranked<AskOrder>, PriceLevel>,
    bids: BTreeMap<Ranked<BidOrder>, PriceLevel>,
}

impl BookMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the view with a complete book.
    pub fn reset(&mut self, book: &LevelChanges) {
        self.asks = book.asks.iter().map(|l| (Ranked::new(l.price), *l)).collect();
        self.bids = book.bids.iter().map(|l| (Ranked::new(l.price), *l)).collect();
        debug!(asks = self.asks.len(), bids = self.bids.len(), "Mirror reset");
    }

    /// Apply one change-set: removals, then additions, then updates.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<(), MirrorError> {
        remove_all(&mut self.asks, &changes.removals.asks)?;
        remove_all(&mut self.bids, &changes.removals.bids)?;
        add_all(&mut self.asks, &changes.additions.asks)?;
        add_all(&mut self.bids, &changes.additions.bids)?;
        update_all(&mut self.asks, &changes.updates.asks)?;
        update_all(&mut self.bids, &changes.updates.bids)?;
        Ok(())
    }

    pub fn asks(&self) -> Vec<PriceLevel> {
        self.asks.values().copied().collect()
    }

    pub fn bids(&self) -> Vec<PriceLevel> {
        self.bids.values().copied().collect()
    }

    pub fn book(&self) -> LevelChanges {
        LevelChanges::new(self.asks(), self.bids())
    }

    pub fn checksum(&self) -> String {
        compute_checksum(&self.asks(), &self.bids())
    }

    /// Whether the mirrored view matches a snapshot of the book.
    pub fn matches(&self, snapshot: &BookSnapshot) -> bool {
        self.checksum() == snapshot.checksum
    }
}

fn remove_all<S: SideOrder>(view: &mut BTreeMap<Ranked<S>, PriceLevel>, levels: &[PriceLevel]) -> Result<(), MirrorError> {
    for level in levels {
        view.remove(&Ranked::new(level.price)).ok_or(MirrorError::UnknownLevel {
            side: S::SIDE.as_str(),
            price: level.price,
        })?;
    }
    Ok(())
}

fn add_all<S: SideOrder>(view: &mut BTreeMap<Ranked<S>, PriceLevel>, levels: &[PriceLevel]) -> Result<(), MirrorError> {
    for level in levels {
        if view.insert(Ranked::new(level.price), *level).is_some() {
            return Err(MirrorError::DuplicateLevel {
                side: S::SIDE.as_str(),
                price: level.price,
            });
        }
    }
    Ok(())
}

fn update_all<S: SideOrder>(view: &mut BTreeMap<Ranked<S>, PriceLevel>, levels: &[PriceLevel]) -> Result<(), MirrorError> {
    for level in levels {
        let slot = view.get_mut(&Ranked::new(level.price)).ok_or(MirrorError::UnknownLevel {
            side: S::SIDE.as_str(),
            price: level.price,
        })?;
        *slot = *level;
    }
    Ok(())
}
