//! Floating-point price and size helpers
//!
//! Feed prices and sizes arrive as `f64`. Equality of prices and "zero" sizes
//! are judged with an absolute epsilon tolerance to absorb representation
//! noise. A not-a-number price from the feed means "no price" and is modelled
//! as `Option<Price>::None`; a `Price` itself is never NaN.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Absolute tolerance used for price equality and zero-size checks.
pub const EPSILON: f64 = f64::EPSILON;

/// Whether a size (or size delta) is indistinguishable from zero.
pub fn is_negligible(size: f64) -> bool {
    size.abs() < EPSILON
}

/// Whether two prices are equal within [`EPSILON`].
pub fn prices_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Error returned when constructing a [`Price`] from NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("price is not a number")]
pub struct NotANumber;

/// A valid (non-NaN) price
///
/// Prices within [`EPSILON`] of each other compare equal, everything else
/// follows `f64::total_cmp`. The tolerance only absorbs representation noise
/// of one quoted price. Tolerant equality is not transitive, so a feed must
/// not quote distinct prices closer than [`EPSILON`] apart; map keys built
/// from such prices have no consistent order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    /// Create a price, returning None for NaN
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Get the raw value
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Price {
    type Error = NotANumber;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NotANumber)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Price {}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        if prices_equal(self.0, other.0) {
            Ordering::Equal
        } else {
            self.0.total_cmp(&other.0)
        }
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
