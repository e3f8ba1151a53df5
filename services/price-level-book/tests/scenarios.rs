//! End-to-end scenarios for the price level book
//!
//! Batches are published through a `LocalFeed` and observed the way a
//! consumer would see them: new books, change-sets and book updates.
//!
//! Tests include:
//! - Depth-capped eviction and promotion
//! - Side flip of an existing order
//! - Snapshot reset and empty batches
//! - Mirror consistency across a longer session
//! - Subscription teardown on drop

use std::sync::{Arc, Mutex};

use price_level_book::events::{OrderBatch, OrderEvent};
use price_level_book::mirror::BookMirror;
use price_level_book::{BookConfig, ChangeSet, LevelChanges, LocalFeed, PriceLevel, PriceLevelBook};
use types::ids::{SourceId, Symbol};
use types::order::Side;

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    NewBook(LevelChanges),
    Changes(ChangeSet),
    Update(LevelChanges),
}

struct Harness {
    feed: LocalFeed,
    book: PriceLevelBook,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Harness {
    fn new(depth: usize) -> Self {
        let feed = LocalFeed::new();
        let book = PriceLevelBook::create(&feed, &BookConfig::new("AAPL", "NTV", depth)).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        book.set_on_new_book(move |levels| sink.lock().unwrap().push(Seen::NewBook(levels.clone())));
        let sink = Arc::clone(&seen);
        book.set_on_incremental_change(move |changes| sink.lock().unwrap().push(Seen::Changes(changes.clone())));
        let sink = Arc::clone(&seen);
        book.set_on_book_update(move |levels| sink.lock().unwrap().push(Seen::Update(levels.clone())));

        Self { feed, book, seen }
    }

    fn publish(&self, records: Vec<OrderEvent>, new_snapshot: bool) -> Vec<Seen> {
        let batch = OrderBatch::new(Symbol::new("AAPL"), SourceId::new("NTV"), records);
        self.feed.publish(&batch, new_snapshot);
        std::mem::take(&mut *self.seen.lock().unwrap())
    }

    fn changes(&self, records: Vec<OrderEvent>) -> ChangeSet {
        let seen = self.publish(records, false);
        match seen.as_slice() {
            [Seen::Changes(changes), Seen::Update(_)] => changes.clone(),
            other => panic!("Expected change-set then book update, got {:?}", other),
        }
    }
}

fn pairs(levels: &[PriceLevel]) -> Vec<(f64, f64)> {
    levels.iter().map(|l| (l.price.value(), l.size)).collect()
}

fn ask(index: i64, price: f64, size: f64) -> OrderEvent {
    OrderEvent::new(index, Side::SELL, price, size, index)
}

fn bid(index: i64, price: f64, size: f64) -> OrderEvent {
    OrderEvent::new(index, Side::BUY, price, size, index)
}

#[test]
fn test_depth_capped_eviction_and_promotion() {
    let h = Harness::new(2);

    let c = h.changes(vec![ask(1, 10.0, 5.0)]);
    assert_eq!(pairs(&c.additions.asks), vec![(10.0, 5.0)]);

    let c = h.changes(vec![ask(2, 11.0, 3.0)]);
    assert_eq!(pairs(&c.additions.asks), vec![(11.0, 3.0)]);

    let c = h.changes(vec![ask(3, 9.0, 1.0)]);
    assert_eq!(pairs(&c.additions.asks), vec![(9.0, 1.0)]);
    assert_eq!(pairs(&c.removals.asks), vec![(11.0, 3.0)]);

    let c = h.changes(vec![ask(1, 10.0, 7.0)]);
    assert_eq!(pairs(&c.updates.asks), vec![(10.0, 7.0)]);
    assert!(c.additions.is_empty());
    assert!(c.removals.is_empty());

    let c = h.changes(vec![OrderEvent::removal(3, 5)]);
    assert_eq!(pairs(&c.removals.asks), vec![(9.0, 1.0)]);
    assert_eq!(pairs(&c.additions.asks), vec![(11.0, 3.0)]);

    assert_eq!(pairs(&h.book.asks()), vec![(10.0, 7.0), (11.0, 3.0)]);
}

#[test]
fn test_bids_rank_descending() {
    let h = Harness::new(2);
    h.changes(vec![bid(1, 9.0, 1.0), bid(2, 10.0, 2.0), bid(3, 8.0, 3.0)]);
    assert_eq!(pairs(&h.book.bids()), vec![(10.0, 2.0), (9.0, 1.0)]);
}

#[test]
fn test_side_flip_moves_contribution() {
    let h = Harness::new(0);
    h.changes(vec![bid(1, 10.0, 4.0)]);

    let c = h.changes(vec![OrderEvent::new(1, Side::SELL, 10.0, 4.0, 2)]);

    assert_eq!(pairs(&c.removals.bids), vec![(10.0, 4.0)]);
    assert_eq!(pairs(&c.additions.asks), vec![(10.0, 4.0)]);
    assert!(h.book.bids().is_empty());
    assert_eq!(pairs(&h.book.asks()), vec![(10.0, 4.0)]);
}

#[test]
fn test_remove_then_add_same_price_across_batches() {
    let h = Harness::new(0);
    h.changes(vec![ask(1, 10.0, 4.0)]);

    let c = h.changes(vec![OrderEvent::removal(1, 2)]);
    assert_eq!(pairs(&c.removals.asks), vec![(10.0, 4.0)]);

    let c = h.changes(vec![ask(2, 10.0, 4.0)]);
    assert_eq!(pairs(&c.additions.asks), vec![(10.0, 4.0)]);
    assert!(c.updates.is_empty());
}

#[test]
fn test_snapshot_replaces_book() {
    let h = Harness::new(0);
    h.changes(vec![ask(1, 10.0, 4.0), bid(2, 9.0, 1.0)]);

    let seen = h.publish(vec![ask(7, 12.0, 2.0)], true);

    match seen.as_slice() {
        [Seen::NewBook(levels)] => {
            assert_eq!(pairs(&levels.asks), vec![(12.0, 2.0)]);
            assert!(levels.bids.is_empty());
        }
        other => panic!("Expected a single new book, got {:?}", other),
    }
    assert_eq!(h.book.order_count(), 1);
}

#[test]
fn test_empty_snapshot_yields_empty_book() {
    let h = Harness::new(0);
    h.changes(vec![ask(1, 10.0, 4.0)]);

    let seen = h.publish(vec![], true);

    assert_eq!(seen, vec![Seen::NewBook(LevelChanges::default())]);
    assert!(h.book.asks().is_empty());
}

#[test]
fn test_empty_incremental_batch_is_silent() {
    let h = Harness::new(0);
    h.changes(vec![ask(1, 10.0, 4.0)]);

    assert!(h.publish(vec![], false).is_empty());
    assert_eq!(pairs(&h.book.asks()), vec![(10.0, 4.0)]);
}

#[test]
fn test_unknown_removal_changes_nothing() {
    let h = Harness::new(0);
    h.changes(vec![ask(1, 10.0, 4.0)]);

    let c = h.changes(vec![OrderEvent::removal(42, 2)]);

    assert!(c.is_empty());
    assert_eq!(h.book.metrics().export()["records_ignored"], 1);
}

#[test]
fn test_mirror_tracks_book_through_session() {
    let h = Harness::new(3);
    let mut mirror = BookMirror::new();

    let batches: Vec<(Vec<OrderEvent>, bool)> = vec![
        (vec![ask(1, 10.0, 1.0), ask(2, 11.0, 1.0), bid(3, 9.0, 2.0)], true),
        (vec![ask(4, 12.0, 1.0), ask(5, 13.0, 1.0), ask(6, 9.5, 4.0)], false),
        (vec![OrderEvent::removal(6, 3), ask(1, 10.0, 3.0), bid(7, 8.0, 1.0)], false),
        (vec![ask(2, 12.0, 2.0), OrderEvent::removal(4, 4)], false),
        (vec![bid(3, 9.0, 5.0), OrderEvent::new(5, Side::BUY, 8.5, 1.0, 5)], false),
        (vec![OrderEvent::removal(1, 6), OrderEvent::removal(2, 6)], false),
    ];

    for (records, new_snapshot) in batches {
        for seen in h.publish(records, new_snapshot) {
            match seen {
                Seen::NewBook(levels) => mirror.reset(&levels),
                Seen::Changes(changes) => mirror.apply(&changes).unwrap(),
                Seen::Update(levels) => assert_eq!(mirror.book(), levels),
            }
        }
        let snapshot = h.book.snapshot();
        assert!(snapshot.verify());
        assert!(mirror.matches(&snapshot));
    }
}

#[test]
fn test_drop_closes_subscription() {
    let feed = LocalFeed::new();
    let book = PriceLevelBook::create(&feed, &BookConfig::new("AAPL", "NTV", 5)).unwrap();
    assert_eq!(feed.subscriber_count(), 1);

    drop(book);

    assert_eq!(feed.subscriber_count(), 0);
    let batch = OrderBatch::new(Symbol::new("AAPL"), SourceId::new("NTV"), vec![ask(1, 10.0, 1.0)]);
    assert_eq!(feed.publish(&batch, false), 0);
}

#[test]
fn test_books_for_other_pairs_are_isolated() {
    let feed = LocalFeed::new();
    let aapl = PriceLevelBook::create(&feed, &BookConfig::new("AAPL", "NTV", 0)).unwrap();
    let msft = PriceLevelBook::create(&feed, &BookConfig::new("MSFT", "NTV", 0)).unwrap();

    let batch = OrderBatch::new(Symbol::new("MSFT"), SourceId::new("NTV"), vec![bid(1, 300.0, 1.0)]);
    feed.publish(&batch, false);

    assert!(aapl.bids().is_empty());
    assert_eq!(pairs(&msft.bids()), vec![(300.0, 1.0)]);
}

#[test]
fn test_shut_down_feed_rejects_book() {
    let feed = LocalFeed::new();
    feed.shutdown();
    assert!(PriceLevelBook::create(&feed, &BookConfig::new("AAPL", "NTV", 0)).is_err());
}
