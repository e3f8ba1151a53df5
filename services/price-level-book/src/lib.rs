//! Price Level Book
//!
//! Consumes order-level feed events for one symbol/source pair and maintains
//! an aggregated, depth-limited price level book:
//! - Order ledger keyed by order index
//! - Per-batch translation of order records into net level deltas
//! - Bounded ask/bid level stores with a top-N visibility cursor
//! - Incremental change-sets restricted to the visible window
//! - Checksummed snapshots and a consumer-side mirror for verification
//!
//! # Architecture
//!
//! ```text
//!   OrderFeed batches
//!          │
//!     ┌────▼────┐
//!     │ Ledger  │  ← previous state of each order
//!     └────┬────┘
//!          │
//!   ┌──────▼──────┐
//!   │ Translator  │  ← net size delta per (side, price)
//!   └──┬───────┬──┘
//!      │       │
//!  ┌───▼──┐ ┌──▼───┐
//!  │ Asks │ │ Bids │  ← bounded stores, top-N cursor
//!  └───┬──┘ └──┬───┘
//!      │       │
//!  ┌───▼───────▼───┐
//!  │   Observers   │  ← new book / change-set / book update
//!  └───────────────┘
//! ```

pub mod book;
pub mod changes;
pub mod config;
pub mod delta;
pub mod events;
pub mod feed;
pub mod ledger;
pub mod level;
pub mod metrics;
pub mod mirror;
pub mod snapshot;
pub mod store;

pub use book::{BookNotification, BookState, PriceLevelBook};
pub use changes::{ChangeSet, LevelChanges};
pub use config::BookConfig;
pub use events::{EventFlags, OrderBatch, OrderEvent, RecordKind};
pub use feed::{FeedSubscription, LocalFeed, OrderFeed};
pub use level::PriceLevel;
