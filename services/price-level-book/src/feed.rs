//! Upstream feed seam
//!
//! The book does not talk to a market-data transport directly. It subscribes
//! through an [`OrderFeed`], which invokes a listener with each batch of order
//! records and a "new snapshot" flag, and hands back a [`FeedSubscription`]
//! that the book closes when it is dropped.
//!
//! [`LocalFeed`] is an in-process feed that routes published batches to the
//! subscribers of the batch's symbol/source pair.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};
use types::errors::FeedError;
use types::ids::{SourceId, Symbol};

use crate::events::OrderBatch;

/// Callback invoked with each batch and its "new snapshot" flag.
pub type BatchListener = Arc<dyn Fn(&OrderBatch, bool) + Send + Sync>;

/// Source of order batches for one symbol/source pair.
pub trait OrderFeed {
    fn subscribe(
        &self,
        symbol: &Symbol,
        source: &SourceId,
        listener: BatchListener,
    ) -> Result<Box<dyn FeedSubscription>, FeedError>;
}

/// Handle of an active subscription.
pub trait FeedSubscription: Send {
    /// Stop delivery. Batches published after this returns no longer reach
    /// the listener; a publish already in progress on another thread may
    /// still complete its delivery.
    fn close(&mut self);
}

struct Subscriber {
    symbol: Symbol,
    source: SourceId,
    listener: BatchListener,
}

#[derive(Default)]
struct LocalFeedInner {
    subscribers: BTreeMap<u64, Subscriber>,
    next_id: u64,
    closed: bool,
}

/// In-process feed.
#[derive(Clone, Default)]
pub struct LocalFeed {
    inner: Arc<Mutex<LocalFeedInner>>,
}

impl LocalFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a batch to every subscriber of its symbol/source pair.
    ///
    /// Returns the number of listeners invoked. Listeners run on the calling
    /// thread, outside the feed's own lock.
    pub fn publish(&self, batch: &OrderBatch, new_snapshot: bool) -> usize {
        let listeners: Vec<BatchListener> = self
            .lock()
            .subscribers
            .values()
            .filter(|s| s.symbol == batch.symbol && s.source == batch.source)
            .map(|s| Arc::clone(&s.listener))
            .collect();

        debug!(
            symbol = %batch.symbol,
            source = %batch.source,
            records = batch.len(),
            new_snapshot,
            listeners = listeners.len(),
            "Publishing batch"
        );

        for listener in &listeners {
            listener(batch, new_snapshot);
        }
        listeners.len()
    }

    /// Drop all subscribers and reject new subscriptions.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.subscribers.clear();
        info!("Local feed shut down");
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, LocalFeedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OrderFeed for LocalFeed {
    fn subscribe(
        &self,
        symbol: &Symbol,
        source: &SourceId,
        listener: BatchListener,
    ) -> Result<Box<dyn FeedSubscription>, FeedError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(FeedError::Closed);
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(
            id,
            Subscriber {
                symbol: symbol.clone(),
                source: source.clone(),
                listener,
            },
        );

        debug!(id, %symbol, %source, "Subscriber attached");
        Ok(Box::new(LocalSubscription {
            id,
            feed: Arc::clone(&self.inner),
            open: true,
        }))
    }
}

struct LocalSubscription {
    id: u64,
    feed: Arc<Mutex<LocalFeedInner>>,
    open: bool,
}

impl FeedSubscription for LocalSubscription {
    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .remove(&self.id);
        debug!(id = self.id, "Subscriber detached");
    }
}

impl Drop for LocalSubscription {
    fn drop(&mut self) {
        self.close();
    }
}
