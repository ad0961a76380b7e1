//! Property tests: the book invariants hold after every processed order,
//! for arbitrary order streams.

use matchbook_rs::prelude::*;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

#[derive(Debug, Clone, Copy)]
struct Op {
    side: Side,
    kind: OrderKind,
    price: u64,
    quantity: u64,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    (any::<bool>(), 0u8..5, 1u64..40, 1u64..20).prop_map(|(is_buy, kind_roll, price, quantity)| {
        Op {
            side: if is_buy { Side::Buy } else { Side::Sell },
            // Roughly one in five orders is a market order.
            kind: if kind_roll == 0 {
                OrderKind::Market
            } else {
                OrderKind::Limit
            },
            price,
            quantity,
        }
    })
}

fn order_from(op: Op, id: u64) -> Order {
    Order {
        id,
        symbol_fp: symbol_fingerprint("BTC-USD"),
        side: op.side,
        kind: op.kind,
        price: match op.kind {
            OrderKind::Limit => op.price,
            OrderKind::Market => 0,
        },
        quantity: op.quantity,
        timestamp: id,
    }
}

fn assert_book_invariants(book: &OrderBook) -> Result<(), TestCaseError> {
    for side in [Side::Buy, Side::Sell] {
        for price in book.level_prices(side) {
            let orders = book.orders_at(side, price);
            let level = book.level(side, price).expect("level for populated price");

            // Aggregates equal the FIFO they cache.
            prop_assert_eq!(
                level.total_quantity,
                orders.iter().map(|o| o.quantity).sum::<u64>()
            );
            prop_assert_eq!(level.order_count, orders.len() as u64);
            prop_assert!(!orders.is_empty(), "empty FIFO left behind at {}", price);
            prop_assert!(orders.iter().all(|o| o.quantity > 0));
        }
    }

    // No price appears on both sides.
    for price in book.level_prices(Side::Buy) {
        prop_assert!(book.level(Side::Sell, price).is_none());
    }

    // An uncrossed top of book.
    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        prop_assert!(bid < ask, "crossed book: {} >= {}", bid, ask);
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold_after_every_order(
        ops in prop::collection::vec(op_strategy(), 1..200)
    ) {
        let mut book = OrderBook::new("BTC-USD");

        for (index, op) in ops.into_iter().enumerate() {
            let order = order_from(op, index as u64 + 1);
            let outcome = book.process_order(&order);

            // Conservation: executed plus remainder is the submission.
            prop_assert_eq!(
                outcome.executed_quantity() + outcome.remainder,
                order.quantity
            );
            for fill in &outcome.fills {
                prop_assert!(fill.quantity > 0);
                prop_assert!(fill.quantity <= order.quantity);
            }

            // Market remainders never rest.
            if order.kind == OrderKind::Market {
                prop_assert!(!outcome.rested);
            }

            // A rested limit remainder is exactly one new FIFO entry at
            // the order's own price.
            if outcome.rested {
                let resting = book.orders_at(order.side, order.price);
                let last = resting.last().expect("rested order present");
                prop_assert_eq!(last.id, order.id);
                prop_assert_eq!(last.quantity, outcome.remainder);
            }

            assert_book_invariants(&book)?;
        }
    }

    #[test]
    fn prop_fills_never_exceed_resting_quantity(
        resting_qty in 1u64..50,
        taker_qty in 1u64..50,
    ) {
        let mut book = OrderBook::new("BTC-USD");
        book.process_order(&order_from(
            Op { side: Side::Sell, kind: OrderKind::Limit, price: 10, quantity: resting_qty },
            1,
        ));
        let outcome = book.process_order(&order_from(
            Op { side: Side::Buy, kind: OrderKind::Limit, price: 10, quantity: taker_qty },
            2,
        ));

        prop_assert_eq!(outcome.fills.len(), 1);
        prop_assert_eq!(outcome.fills[0].quantity, resting_qty.min(taker_qty));
        prop_assert_eq!(outcome.fills[0].price, 10);
    }
}
