//! Price levels and side ordering
//!
//! Asks rank ascending by price (lowest is best), bids rank descending
//! (highest is best). Both sides share one comparator parameterized by a
//! [`SideOrder`] marker type. An absent price always ranks worst.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use types::numeric::Price;
use types::order::BookSide;

/// Aggregate resting size at one price on one side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    /// Sum of the sizes of all orders contributing to this level.
    pub size: f64,
    /// Timestamp of the last event that touched this level.
    pub time: i64,
}

impl PriceLevel {
    pub fn new(price: Price, size: f64, time: i64) -> Self {
        Self { price, size, time }
    }
}

/// Ranking of prices on one book side.
pub trait SideOrder: Copy + Default + fmt::Debug + Send + 'static {
    const SIDE: BookSide;

    /// `Less` when `a` is the better price.
    fn rank(a: Price, b: Price) -> Ordering;
}

/// Ask side: lowest price first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AskOrder;

impl SideOrder for AskOrder {
    const SIDE: BookSide = BookSide::Ask;

    fn rank(a: Price, b: Price) -> Ordering {
        a.cmp(&b)
    }
}

/// Bid side: highest price first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BidOrder;

impl SideOrder for BidOrder {
    const SIDE: BookSide = BookSide::Bid;

    fn rank(a: Price, b: Price) -> Ordering {
        b.cmp(&a)
    }
}

/// A price keyed by its side ranking, so ordered maps iterate best-first.
pub struct Ranked<S> {
    price: Price,
    _side: PhantomData<S>,
}

impl<S: SideOrder> Ranked<S> {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            _side: PhantomData,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }
}

impl<S> Clone for Ranked<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Ranked<S> {}

impl<S> fmt::Debug for Ranked<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ranked").field(&self.price).finish()
    }
}

impl<S: SideOrder> PartialEq for Ranked<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S: SideOrder> Eq for Ranked<S> {}

impl<S: SideOrder> Ord for Ranked<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        S::rank(self.price, other.price)
    }
}

impl<S: SideOrder> PartialOrd for Ranked<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
