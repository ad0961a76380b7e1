//! Boundary behaviors of the mapped region and its rings.

use matchbook_rs::matchbook::shm::{N_ORDER, REGION_SIZE};
use matchbook_rs::prelude::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn open_region(dir: &tempfile::TempDir) -> Arc<SharedRegion> {
    SharedRegion::open(dir.path().join("region")).expect("open region")
}

fn sample_order(id: u64) -> Order {
    Order {
        id,
        symbol_fp: symbol_fingerprint("BTC-USD"),
        side: Side::Buy,
        kind: OrderKind::Limit,
        price: 5_000,
        quantity: 1,
        timestamp: 1,
    }
}

#[test]
fn test_zero_initialized_region_is_reinitialized() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("region");

    // A correctly sized but all-zero file: version == 0, so the header
    // must be populated on open.
    let file = std::fs::File::create(&path).expect("create");
    file.set_len(REGION_SIZE as u64).expect("set_len");
    drop(file);

    let region = SharedRegion::open(&path).expect("open");
    assert!(region.version().load(Ordering::Acquire) > 0);
    assert_eq!(region.next_trade_id().load(Ordering::Relaxed), 1);
}

#[test]
fn test_exactly_full_ring_offer_fails_until_one_poll() {
    let dir = tempfile::tempdir().expect("tempdir");
    let region = open_region(&dir);
    let ring = OrderRing::new(region);

    // Fill every usable slot (capacity is one below the slot count).
    for id in 1..N_ORDER as u64 {
        assert!(ring.offer(&sample_order(id)));
    }
    assert!(ring.is_full());
    assert!(!ring.offer(&sample_order(u64::MAX)));

    // One poll frees exactly one slot.
    assert_eq!(ring.poll().map(|o| o.id), Some(1));
    assert!(!ring.is_full());
    assert!(ring.offer(&sample_order(u64::MAX)));
    assert!(ring.is_full());
}

#[test]
fn test_zeroed_slot_is_discarded_without_book_effects() {
    let dir = tempfile::tempdir().expect("tempdir");
    let region = open_region(&dir);
    let registry = Arc::new(SymbolRegistry::with_defaults().expect("defaults"));
    let mut engine = MatchingEngine::new(region.clone(), registry);

    // Publish one zeroed slot (id = 0) by advancing the tail only.
    region.order_tail().store(1, Ordering::Release);

    // The engine consumes nothing matchable; head still advances.
    assert!(!engine.poll_once().expect("poll"));
    assert_eq!(region.order_head().load(Ordering::Relaxed), 1);
    assert_eq!(engine.stats().snapshot().corrupt_slots, 1);
    assert_eq!(engine.stats().orders_processed(), 0);
}

#[test]
fn test_order_slot_serialization_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let region = open_region(&dir);
    let ring = OrderRing::new(region);

    let order = Order {
        id: 424_242,
        symbol_fp: symbol_fingerprint("SOL-USD"),
        side: Side::Sell,
        kind: OrderKind::Market,
        price: 0,
        quantity: 987,
        timestamp: 1_700_000_000_000_000_321,
    };
    assert!(ring.offer(&order));
    assert_eq!(ring.poll(), Some(order));
}

#[test]
fn test_market_data_record_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let region = open_region(&dir);
    let table = MarketDataTable::new(region);

    let md = MarketData {
        symbol_fp: symbol_fingerprint("ADA-USD"),
        last_price: 45,
        last_quantity: 1_000,
        volume_24h: 123_456,
        best_bid: 44,
        best_ask: 46,
        timestamp: 9,
    };
    table.write(7, &md);
    assert_eq!(table.read(7), md);
}

#[test]
fn test_consumed_counterpart_leaves_book_indistinguishable() {
    // Submitting then fully matching a marketable limit order leaves the
    // book structurally equal to one that never saw the pair.
    let mut traded = OrderBook::new("BTC-USD");
    let mut untouched = OrderBook::new("BTC-USD");

    for book in [&mut traded, &mut untouched] {
        book.process_order(&Order {
            id: 1,
            symbol_fp: symbol_fingerprint("BTC-USD"),
            side: Side::Buy,
            kind: OrderKind::Limit,
            price: 4_800,
            quantity: 3,
            timestamp: 1,
        });
    }

    traded.process_order(&Order {
        id: 2,
        symbol_fp: symbol_fingerprint("BTC-USD"),
        side: Side::Sell,
        kind: OrderKind::Limit,
        price: 5_000,
        quantity: 6,
        timestamp: 2,
    });
    let outcome = traded.process_order(&Order {
        id: 3,
        symbol_fp: symbol_fingerprint("BTC-USD"),
        side: Side::Buy,
        kind: OrderKind::Limit,
        price: 5_000,
        quantity: 6,
        timestamp: 3,
    });
    assert!(outcome.is_complete());

    let traded_snapshot = traded.snapshot(usize::MAX);
    let untouched_snapshot = untouched.snapshot(usize::MAX);
    assert_eq!(traded_snapshot.bids, untouched_snapshot.bids);
    assert_eq!(traded_snapshot.asks, untouched_snapshot.asks);
    assert_eq!(traded.best_bid(), untouched.best_bid());
    assert_eq!(traded.best_ask(), untouched.best_ask());
}

#[test]
fn test_reader_rejects_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(RegionReader::open(dir.path().join("absent")).is_err());
}
