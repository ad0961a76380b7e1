//! End-to-end matching scenarios driven through admission, the mapped
//! rings, and the engine — each starting from an empty BTC-USD book.

use crate::common::{Venue, side_shape};
use matchbook_rs::prelude::*;

fn seed_two_asks(venue: &mut Venue) {
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Sell, 5_000, 10)
        .expect("submit");
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Sell, 5_100, 10)
        .expect("submit");
    venue.drain();
}

#[test]
fn test_single_level_partial_fill() {
    let mut venue = Venue::new();
    seed_two_asks(&mut venue);

    venue
        .gateway
        .submit_limit("BTC-USD", Side::Buy, 5_100, 1)
        .expect("submit");
    venue.drain();

    let trades = venue.collect_trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, 3);
    assert_eq!(trades[0].sell_order_id, 1);
    assert_eq!(trades[0].price, 5_000);
    assert_eq!(trades[0].quantity, 1);

    let book = venue.btc_book();
    assert_eq!(
        side_shape(book, Side::Sell),
        vec![(5_000, 9, 1), (5_100, 10, 1)]
    );
    assert!(side_shape(book, Side::Buy).is_empty());
}

#[test]
fn test_sweep_two_levels() {
    let mut venue = Venue::new();
    seed_two_asks(&mut venue);

    // Take the first level down to 9 as in the partial-fill scenario.
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Buy, 5_100, 1)
        .expect("submit");
    venue.drain();
    venue.collect_trades();

    venue
        .gateway
        .submit_limit("BTC-USD", Side::Buy, 5_100, 11)
        .expect("submit");
    venue.drain();

    let trades = venue.collect_trades();
    assert_eq!(trades.len(), 2);
    assert_eq!(
        (trades[0].buy_order_id, trades[0].sell_order_id, trades[0].price, trades[0].quantity),
        (4, 1, 5_000, 9)
    );
    assert_eq!(
        (trades[1].buy_order_id, trades[1].sell_order_id, trades[1].price, trades[1].quantity),
        (4, 2, 5_100, 2)
    );
    // Trade ids stay monotonic across scenarios on one region.
    assert!(trades[0].trade_id < trades[1].trade_id);

    let book = venue.btc_book();
    assert_eq!(side_shape(book, Side::Sell), vec![(5_100, 8, 1)]);
    assert!(side_shape(book, Side::Buy).is_empty());
}

#[test]
fn test_time_priority_within_level() {
    let mut venue = Venue::new();
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Sell, 5_000, 5)
        .expect("submit");
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Sell, 5_000, 3)
        .expect("submit");
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Buy, 5_000, 6)
        .expect("submit");
    venue.drain();

    let trades = venue.collect_trades();
    assert_eq!(trades.len(), 2);
    assert_eq!((trades[0].sell_order_id, trades[0].quantity), (1, 5));
    assert_eq!((trades[1].sell_order_id, trades[1].quantity), (2, 1));

    let book = venue.btc_book();
    assert_eq!(side_shape(book, Side::Sell), vec![(5_000, 2, 1)]);
    let survivors = book.orders_at(Side::Sell, 5_000);
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].id, 2);
}

#[test]
fn test_best_price_selection_on_opposite_side() {
    let mut venue = Venue::new();
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Buy, 4_900, 10)
        .expect("submit");
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Buy, 5_000, 10)
        .expect("submit");
    venue.drain();
    assert_eq!(venue.btc_book().best_bid(), Some(5_000));

    venue
        .gateway
        .submit_limit("BTC-USD", Side::Sell, 4_900, 1)
        .expect("submit");
    venue.drain();

    let trades = venue.collect_trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(
        (trades[0].buy_order_id, trades[0].sell_order_id, trades[0].price, trades[0].quantity),
        (2, 3, 5_000, 1)
    );

    let book = venue.btc_book();
    assert_eq!(
        side_shape(book, Side::Buy),
        vec![(5_000, 9, 1), (4_900, 10, 1)]
    );
}

#[test]
fn test_market_order_multi_level_sweep_drops_remainder() {
    let mut venue = Venue::new();
    for (price, quantity) in [(50_000, 5), (50_050, 3), (50_100, 5)] {
        venue
            .gateway
            .submit_limit("BTC-USD", Side::Sell, price, quantity)
            .expect("submit");
    }
    venue
        .gateway
        .submit_market("BTC-USD", Side::Buy, 25)
        .expect("submit");
    venue.drain();

    let trades = venue.collect_trades();
    let shapes: Vec<(u64, u64)> = trades.iter().map(|t| (t.price, t.quantity)).collect();
    assert_eq!(shapes, vec![(50_000, 5), (50_050, 3), (50_100, 5)]);

    let book = venue.btc_book();
    assert!(book.is_empty());
    assert_eq!(book.best_bid(), None);
    assert_eq!(book.best_ask(), None);
}

#[test]
fn test_unknown_fingerprint_injected_past_admission() {
    let mut venue = Venue::new();

    // Valid-shaped order with an unregistered fingerprint, written to the
    // ring directly so admission cannot reject it.
    let rogue = Order {
        id: 77,
        symbol_fp: symbol_fingerprint("XRP-USD"),
        side: Side::Buy,
        kind: OrderKind::Limit,
        price: 100,
        quantity: 1,
        timestamp: 1,
    };
    let intake = OrderRing::new(venue.region.clone());
    assert!(intake.offer(&rogue));

    venue.drain();

    let stats = venue.engine.stats();
    assert_eq!(stats.unknown_symbol_drops(), 1);
    assert!(venue.collect_trades().is_empty());
    assert!(venue.engine.book(rogue.symbol_fp).is_none());
    assert_eq!(
        venue
            .region
            .order_head()
            .load(std::sync::atomic::Ordering::Relaxed),
        1
    );
}

#[test]
fn test_dynamically_registered_symbol_trades_end_to_end() {
    let mut venue = Venue::new();
    let info = venue.registry.register("DOT-USD").expect("register");
    assert_eq!(info.index, DEFAULT_SYMBOLS.len());

    venue
        .gateway
        .submit_limit("DOT-USD", Side::Sell, 700, 2)
        .expect("submit");
    venue
        .gateway
        .submit_limit("DOT-USD", Side::Buy, 700, 2)
        .expect("submit");
    venue.drain();

    let trades = venue.collect_trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].symbol_fp, symbol_fingerprint("DOT-USD"));

    let reader = RegionReader::open(venue.region.path()).expect("reader");
    let md = reader.market_data(info.index);
    assert_eq!(md.symbol_fp, info.fingerprint);
    assert_eq!(md.last_price, 700);
}

#[test]
fn test_market_data_mirrors_each_processed_order() {
    let mut venue = Venue::new();
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Sell, 5_000, 10)
        .expect("submit");
    venue
        .gateway
        .submit_limit("BTC-USD", Side::Buy, 5_000, 4)
        .expect("submit");
    venue.drain();

    let reader = RegionReader::open(venue.region.path()).expect("reader");
    let fp = symbol_fingerprint("BTC-USD");
    let (index, md) = reader.find_symbol(fp).expect("market data");
    assert_eq!(index, 0);
    assert_eq!(md.last_price, 5_000);
    assert_eq!(md.last_quantity, 4);
    assert_eq!(md.volume_24h, 4);
    assert_eq!(md.best_ask, 5_000);
    assert_eq!(md.best_bid, 0);
    assert!(md.timestamp > 0);
    assert!(reader.last_update_ts() > 0);

    let level = reader.level(index, Side::Sell, 5_000);
    assert_eq!(level.total_quantity, 6);
    assert_eq!(level.order_count, 1);
}
