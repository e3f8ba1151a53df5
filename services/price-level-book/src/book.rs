//! Book controller
//!
//! [`BookState`] runs one processing cycle per batch: translate records into
//! net level deltas, apply them to both bounded stores and decide what to
//! announce. A batch flagged as a new snapshot first clears the ledger and
//! both sides and is announced as a whole new book; any other batch is
//! announced as a change-set plus the resulting visible book.
//!
//! [`PriceLevelBook`] wraps the state in a single mutex together with the
//! observers, subscribes to an [`OrderFeed`] on creation and unsubscribes
//! when dropped. Observers run while the lock is held: they must not call
//! back into the book and should return promptly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use tracing::{debug, info};
use types::errors::BookError;
use types::ids::{SourceId, Symbol};

use crate::changes::{combine, ChangeSet, LevelChanges};
use crate::config::BookConfig;
use crate::delta::DeltaTranslator;
use crate::events::{OrderBatch, OrderEvent, RecordKind};
use crate::feed::{BatchListener, FeedSubscription, OrderFeed};
use crate::ledger::OrderLedger;
use crate::level::{AskOrder, BidOrder, PriceLevel};
use crate::metrics::BookMetrics;
use crate::snapshot::BookSnapshot;
use crate::store::LevelStore;

/// What a processing cycle announces.
#[derive(Debug, Clone, PartialEq)]
pub enum BookNotification {
    /// The book was rebuilt from a snapshot; carries the whole visible book.
    NewBook(LevelChanges),
    /// Incremental cycle: the visible changes and the resulting visible book.
    Incremental { changes: ChangeSet, book: LevelChanges },
}

/// Result of one processing cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    /// None for an empty incremental batch.
    pub notification: Option<BookNotification>,
    /// Removal records for orders that were never seen.
    pub ignored: usize,
}

/// Ledger and both sides of one symbol/source book.
#[derive(Debug)]
pub struct BookState {
    symbol: Symbol,
    source: SourceId,
    ledger: OrderLedger,
    asks: LevelStore<AskOrder>,
    bids: LevelStore<BidOrder>,
    version: u64,
}

impl BookState {
    pub fn new(symbol: Symbol, source: SourceId, depth: usize) -> Self {
        Self {
            symbol,
            source,
            ledger: OrderLedger::new(),
            asks: LevelStore::new(depth),
            bids: LevelStore::new(depth),
            version: 0,
        }
    }

    /// Run one cycle over a batch of records.
    pub fn process(&mut self, records: &[OrderEvent], new_snapshot: bool) -> Cycle {
        if new_snapshot {
            self.reset();
        }

        if records.is_empty() {
            let notification = new_snapshot.then(|| {
                self.version += 1;
                BookNotification::NewBook(LevelChanges::default())
            });
            return Cycle {
                notification,
                ignored: 0,
            };
        }

        let deltas = DeltaTranslator::translate(&mut self.ledger, records);
        let ask_changes = self.asks.apply(&deltas.asks);
        let bid_changes = self.bids.apply(&deltas.bids);
        self.version += 1;

        let book = self.visible_book();
        let notification = if new_snapshot {
            BookNotification::NewBook(book)
        } else {
            BookNotification::Incremental {
                changes: combine(&ask_changes, &bid_changes),
                book,
            }
        };

        Cycle {
            notification: Some(notification),
            ignored: deltas.ignored,
        }
    }

    /// Drop every order and level.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.asks.clear();
        self.bids.clear();
    }

    /// Visible levels of both sides, best first.
    pub fn visible_book(&self) -> LevelChanges {
        LevelChanges::new(self.asks.visible(), self.bids.visible())
    }

    pub fn asks(&self) -> Vec<PriceLevel> {
        self.asks.visible()
    }

    pub fn bids(&self) -> Vec<PriceLevel> {
        self.bids.visible()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot::new(
            self.symbol.clone(),
            self.source.clone(),
            self.version,
            self.asks.visible(),
            self.bids.visible(),
        )
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn depth(&self) -> usize {
        self.asks.depth()
    }

    /// Number of live orders in the ledger.
    pub fn order_count(&self) -> usize {
        self.ledger.len()
    }

    /// Number of stored levels per side (ask, bid), including hidden ones.
    pub fn stored_levels(&self) -> (usize, usize) {
        (self.asks.len(), self.bids.len())
    }

    /// Number of cycles that produced a notification.
    pub fn version(&self) -> u64 {
        self.version
    }
}

type BookObserver = Box<dyn FnMut(&LevelChanges) + Send>;
type ChangeObserver = Box<dyn FnMut(&ChangeSet) + Send>;

#[derive(Default)]
struct Observers {
    on_new_book: Option<BookObserver>,
    on_book_update: Option<BookObserver>,
    on_incremental_change: Option<ChangeObserver>,
}

struct Core {
    state: BookState,
    observers: Observers,
}

struct Shared {
    core: Mutex<Core>,
    metrics: BookMetrics,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_batch(&self, batch: &OrderBatch, new_snapshot: bool) {
        debug_assert_eq!(batch.kind, RecordKind::Order, "unsupported record kind");

        let started = Instant::now();
        let mut core = self.lock();
        let Core { state, observers } = &mut *core;

        debug_assert_eq!(&batch.symbol, state.symbol(), "batch for another symbol");

        let cycle = state.process(&batch.records, new_snapshot);
        if new_snapshot {
            self.metrics.record_snapshot();
            info!(
                symbol = %state.symbol(),
                source = %state.source(),
                records = batch.len(),
                "New snapshot"
            );
        }

        match &cycle.notification {
            Some(BookNotification::NewBook(book)) => {
                if let Some(on_new_book) = observers.on_new_book.as_mut() {
                    on_new_book(book);
                }
            }
            Some(BookNotification::Incremental { changes, book }) => {
                self.metrics.record_changes(changes);
                debug!(
                    symbol = %state.symbol(),
                    records = batch.len(),
                    additions = changes.additions.len(),
                    updates = changes.updates.len(),
                    removals = changes.removals.len(),
                    ignored = cycle.ignored,
                    "Incremental cycle"
                );
                if let Some(on_incremental_change) = observers.on_incremental_change.as_mut() {
                    on_incremental_change(changes);
                }
                if let Some(on_book_update) = observers.on_book_update.as_mut() {
                    on_book_update(book);
                }
            }
            None => {}
        }

        let elapsed_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.metrics.record_cycle(batch.len(), cycle.ignored, elapsed_ns);
    }
}

/// A price level book for one symbol/source pair.
pub struct PriceLevelBook {
    shared: Arc<Shared>,
    subscription: Mutex<Option<Box<dyn FeedSubscription>>>,
}

impl PriceLevelBook {
    /// Create a book and subscribe it to `feed`.
    pub fn create(feed: &dyn OrderFeed, config: &BookConfig) -> Result<Self, BookError> {
        let book = Self::detached(config)?;

        let weak: Weak<Shared> = Arc::downgrade(&book.shared);
        let listener: BatchListener = Arc::new(move |batch: &OrderBatch, new_snapshot: bool| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_batch(batch, new_snapshot);
            }
        });

        let subscription = {
            let core = book.shared.lock();
            feed.subscribe(core.state.symbol(), core.state.source(), listener)?
        };
        *book.subscription.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        Ok(book)
    }

    /// Create a book without a feed; batches are pushed with
    /// [`PriceLevelBook::process_batch`].
    pub fn detached(config: &BookConfig) -> Result<Self, BookError> {
        config.validate()?;
        let symbol = config.symbol_id()?;
        let source = config.source_id()?;

        info!(%symbol, %source, depth = config.depth, "Price level book created");

        Ok(Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    state: BookState::new(symbol, source, config.depth),
                    observers: Observers::default(),
                }),
                metrics: BookMetrics::new(),
            }),
            subscription: Mutex::new(None),
        })
    }

    /// Process one batch as if it was delivered by the feed.
    pub fn process_batch(&self, batch: &OrderBatch, new_snapshot: bool) {
        self.shared.handle_batch(batch, new_snapshot);
    }

    pub fn set_on_new_book<F>(&self, observer: F)
    where
        F: FnMut(&LevelChanges) + Send + 'static,
    {
        self.shared.lock().observers.on_new_book = Some(Box::new(observer));
    }

    pub fn set_on_book_update<F>(&self, observer: F)
    where
        F: FnMut(&LevelChanges) + Send + 'static,
    {
        self.shared.lock().observers.on_book_update = Some(Box::new(observer));
    }

    pub fn set_on_incremental_change<F>(&self, observer: F)
    where
        F: FnMut(&ChangeSet) + Send + 'static,
    {
        self.shared.lock().observers.on_incremental_change = Some(Box::new(observer));
    }

    pub fn asks(&self) -> Vec<PriceLevel> {
        self.shared.lock().state.asks()
    }

    pub fn bids(&self) -> Vec<PriceLevel> {
        self.shared.lock().state.bids()
    }

    pub fn book(&self) -> LevelChanges {
        self.shared.lock().state.visible_book()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        self.shared.lock().state.snapshot()
    }

    pub fn order_count(&self) -> usize {
        self.shared.lock().state.order_count()
    }

    pub fn depth(&self) -> usize {
        self.shared.lock().state.depth()
    }

    pub fn symbol(&self) -> Symbol {
        self.shared.lock().state.symbol().clone()
    }

    pub fn source(&self) -> SourceId {
        self.shared.lock().state.source().clone()
    }

    pub fn metrics(&self) -> &BookMetrics {
        &self.shared.metrics
    }

    /// Close the feed subscription. Idempotent; also done on drop.
    pub fn close(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut subscription) = subscription {
            subscription.close();
            info!("Price level book unsubscribed");
        }
    }
}

impl Drop for PriceLevelBook {
    fn drop(&mut self) {
        self.close();
    }
}
